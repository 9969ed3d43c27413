use grand_dsp::synth::{PianoEngine, PianoRenderer, SynthConfig};

const SR: f32 = 16_000.0;

fn setup() -> (PianoEngine, PianoRenderer) {
    let mut config = SynthConfig::default();
    config.room.seconds = 0.3;
    let mut engine = PianoEngine::new(config);
    let renderer = engine.init(SR).unwrap();
    (engine, renderer)
}

fn render(renderer: &mut PianoRenderer, seconds: f32) -> (Vec<f32>, Vec<f32>) {
    let frames = (seconds * SR) as usize;
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    renderer.render(&mut left, &mut right);
    (left, right)
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn renders_silence_before_any_note() {
    let (_engine, mut renderer) = setup();
    let (left, right) = render(&mut renderer, 0.1);
    assert!(left.iter().chain(&right).all(|&s| s == 0.0));
}

#[test]
fn renders_sound_after_a_note() {
    let (mut engine, mut renderer) = setup();
    engine.play_note(60, 100).unwrap();
    let (left, right) = render(&mut renderer, 0.3);

    let samples: Vec<f32> = left.iter().chain(&right).copied().collect();
    assert!(samples.iter().any(|s| s.abs() > 0.01));
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
    assert!(samples.iter().all(|s| s.is_finite()));
}

#[test]
fn loud_chord_stays_in_range() {
    let (mut engine, mut renderer) = setup();
    for pitch in [36, 40, 43, 48, 52, 55, 60, 64, 67, 72] {
        engine.play_note(pitch, 127).unwrap();
    }
    let (left, right) = render(&mut renderer, 0.5);
    assert!(peak(&left) <= 1.0);
    assert!(peak(&right) <= 1.0);
    assert!(renderer.gain_reduction_db() < 0.0);
}

#[test]
fn release_decays_to_silence() {
    let (mut engine, mut renderer) = setup();
    engine.play_note(84, 110).unwrap();
    let (held, _) = render(&mut renderer, 0.3);
    engine.stop_note(84);

    // Pitch 84 releases in ~0.78 s; teardown follows 50 ms later and
    // the 0.3 s room tail dies out after that
    let (tail, _) = render(&mut renderer, 0.5);
    let (_, _) = render(&mut renderer, 1.0);
    let (after, _) = render(&mut renderer, 0.1);

    engine.maintain();
    assert_eq!(renderer.voice_count(), 0);
    assert!(!engine.is_sounding(84));
    assert!(peak(&tail[tail.len() - 800..]) < peak(&held));
    assert!(peak(&after) < 1e-3);
}

#[test]
fn interleaved_mono_is_channel_average() {
    let (mut engine, mut renderer) = setup();
    engine.play_note(57, 100).unwrap();
    let mut mono = vec![0.0; 2048];
    renderer.render_interleaved(&mut mono, 1);
    assert!(peak(&mono) > 0.0);
    assert!(peak(&mono) <= 1.0);

    let mut surround = vec![1.0; 4 * 256];
    renderer.render_interleaved(&mut surround, 4);
    for frame in surround.chunks(4) {
        assert_eq!(frame[2], 0.0);
        assert_eq!(frame[3], 0.0);
    }
}
