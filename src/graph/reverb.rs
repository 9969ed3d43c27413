use crate::dsp::convolution::{normalization_scale, PartitionedConvolver};
use crate::dsp::impulse;
use crate::synth::config::RoomSettings;

/*
Convolution Reverb
==================

Places the piano in a synthetic hall. The mono reverb-send bus (every
voice's post-envelope signal times its send level) is convolved with a
stereo decaying-noise impulse response:

    send bus ──→ convolve(IR_left)  ──→ × scale × return ──→ left
             └─→ convolve(IR_right) ──→ × scale × return ──→ right

`scale` is the loudness normalisation of the IR, `return` the level at
which the wet signal joins the master bus (0.18 by default, a little more
than a concert recording would use, to flatter a simple tone).

Processing runs in fixed blocks equal to the render quantum; the
renderer guarantees it never asks for anything else.
*/

pub struct ConvolutionReverb {
    convolver: PartitionedConvolver,
    gain: f32,
}

impl ConvolutionReverb {
    /// Build the hall for `sample_rate`. Allocates the IR and FFT plans.
    pub fn new(room: &RoomSettings, sample_rate: f32, block: usize) -> Self {
        let [left, right] =
            impulse::decaying_noise(sample_rate, room.seconds, room.decay_exponent, room.seed);
        let scale = normalization_scale(&[&left, &right], sample_rate);
        log::debug!(
            "reverb impulse: {} samples per channel, normalisation {scale:.4}",
            left.len()
        );

        Self {
            convolver: PartitionedConvolver::new(&[&left, &right], block),
            gain: scale * room.return_gain,
        }
    }

    pub fn block_size(&self) -> usize {
        self.convolver.block_size()
    }

    /// Convolve one block of the send bus and add the wet signal to
    /// `left`/`right`.
    pub fn process(&mut self, send: &[f32], left: &mut [f32], right: &mut [f32]) {
        self.convolver.process_block(send);
        for (out, wet) in left.iter_mut().zip(self.convolver.output(0)) {
            *out += wet * self.gain;
        }
        for (out, wet) in right.iter_mut().zip(self.convolver.output(1)) {
            *out += wet * self.gain;
        }
    }

    pub fn reset(&mut self) {
        self.convolver.reset();
    }
}
