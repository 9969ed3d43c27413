//! Band-limited wave tables built from Fourier coefficients.
//!
//! A periodic wave is described by its harmonic content: `real[n]` is the
//! cosine amplitude and `imag[n]` the sine amplitude of harmonic `n` (index 0
//! is the DC term and is ignored). One period of the waveform is
//!
//! ```text
//! x(t) = Σ real[n]·cos(2πnt) + imag[n]·sin(2πnt),   t ∈ [0, 1)
//! ```
//!
//! The table is synthesised with an inverse FFT rather than by summing
//! sines, which keeps construction cheap even for long coefficient lists.
//!
//! # Band limiting
//!
//! Harmonic `n` of a note at frequency `f` sits at `n·f`. Anything above
//! Nyquist (`sample_rate / 2`) folds back as inharmonic aliasing, so we keep
//! one table per harmonic count. An oscillator playing at `f` reads the table
//! holding only harmonics `1..=floor(nyquist / f)`.
//!
//! # Normalisation
//!
//! All tables share one scale factor chosen so that the full-bandwidth table
//! peaks at exactly 1.0. The quieter band-limited tables keep their relative
//! level instead of being boosted.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{SynthError, SynthResult};

/// Samples per table (one period).
pub const TABLE_SIZE: usize = 2048;

/// Cosine coefficients of the piano timbre. The 2nd, 3rd and 4th harmonics
/// outweigh the fundamental.
pub const PIANO_REAL: [f32; 9] = [0.0, 0.5, 0.15, 0.3, 0.45, 0.15, 0.08, 0.05, 0.01];

/// Sine coefficients of the piano timbre.
pub const PIANO_IMAG: [f32; 9] = [0.0; 9];

pub struct PeriodicWave {
    /// `tables[k - 1]` holds harmonics `1..=k`.
    tables: Vec<Vec<f32>>,
}

impl PeriodicWave {
    /// Build wave tables from cosine/sine coefficient arrays.
    pub fn from_coefficients(real: &[f32], imag: &[f32]) -> SynthResult<Self> {
        if real.len() != imag.len() {
            return Err(SynthError::periodic_wave(format!(
                "real has {} coefficients but imag has {}",
                real.len(),
                imag.len()
            )));
        }
        if real.len() < 2 {
            return Err(SynthError::periodic_wave(
                "need at least a DC term and one harmonic",
            ));
        }
        if real.len() > TABLE_SIZE / 2 {
            return Err(SynthError::periodic_wave(format!(
                "at most {} coefficients fit a {}-sample table",
                TABLE_SIZE / 2,
                TABLE_SIZE
            )));
        }
        if real.iter().chain(imag).any(|c| !c.is_finite()) {
            return Err(SynthError::periodic_wave("coefficients must be finite"));
        }

        let harmonics = real.len() - 1;
        let mut planner = FftPlanner::<f32>::new();
        let ifft = planner.plan_fft_inverse(TABLE_SIZE);

        let mut tables = Vec::with_capacity(harmonics);
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); TABLE_SIZE];
        for limit in 1..=harmonics {
            spectrum.fill(Complex::new(0.0, 0.0));
            for n in 1..=limit {
                // X[n] = (a - ib)/2 and its mirror make Re(Σ) = a·cos + b·sin
                let bin = Complex::new(real[n] * 0.5, -imag[n] * 0.5);
                spectrum[n] = bin;
                spectrum[TABLE_SIZE - n] = bin.conj();
            }
            ifft.process(&mut spectrum);
            tables.push(spectrum.iter().map(|c| c.re).collect::<Vec<f32>>());
        }

        let peak = tables
            .last()
            .map(|t| t.iter().fold(0.0f32, |acc, &x| acc.max(x.abs())))
            .unwrap_or(0.0);
        if peak <= f32::EPSILON {
            return Err(SynthError::periodic_wave("spectrum has no energy"));
        }

        let scale = 1.0 / peak;
        for table in &mut tables {
            for sample in table.iter_mut() {
                *sample *= scale;
            }
        }

        Ok(Self { tables })
    }

    /// The piano timbre used by every voice.
    pub fn piano() -> SynthResult<Self> {
        Self::from_coefficients(&PIANO_REAL, &PIANO_IMAG)
    }

    /// Highest harmonic number present.
    pub fn harmonics(&self) -> usize {
        self.tables.len()
    }

    /// Table to use for a tone at `frequency`, or `None` if even the
    /// fundamental is above Nyquist.
    pub fn table_for(&self, frequency: f32, sample_rate: f32) -> Option<&[f32]> {
        let nyquist = sample_rate * 0.5;
        let audible = (nyquist / frequency.abs().max(f32::MIN_POSITIVE)).floor() as usize;
        let limit = audible.min(self.tables.len());
        limit.checked_sub(1).map(|idx| self.tables[idx].as_slice())
    }

    /// Read a table at `phase` in [0, 1) with linear interpolation.
    #[inline]
    pub fn sample(table: &[f32], phase: f32) -> f32 {
        let pos = phase * TABLE_SIZE as f32;
        let idx = pos as usize % TABLE_SIZE;
        let next = (idx + 1) % TABLE_SIZE;
        let frac = pos - pos.floor();
        table[idx] + (table[next] - table[idx]) * frac
    }
}
