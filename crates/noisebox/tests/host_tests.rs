use noisebox::audio::PRIME_START_SAMPLES;
use noisebox::{AudioProcessor, AudioState, read_wav, render_samples, render_to_wav};
use noisebox_core::analysis::SampleStats;
use noisebox_core::consts::MIDPOINT;
use noisebox_core::{Controls, Engine, EngineConfig, Selector};
use std::sync::Arc;

#[test]
fn render_to_wav_round_trips_through_hound() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("chirp.wav");

  let mut engine = Engine::default();
  let written = render_to_wav(&mut engine, Selector::Chirp, 0.8, 0.5, &path).unwrap();
  assert_eq!(written, 5_513);

  let (rate, samples) = read_wav(&path).unwrap();
  assert_eq!(rate, 11_025);

  let mut reference = Engine::default();
  assert_eq!(
    samples,
    render_samples(&mut reference, Selector::Chirp, 0.8, written)
  );
}

#[test]
fn render_rejects_negative_length() {
  let dir = tempfile::tempdir().unwrap();
  let mut engine = Engine::default();
  assert!(render_to_wav(&mut engine, Selector::Sine, 1.0, -1.0, dir.path().join("x.wav")).is_err());
}

#[test]
fn render_honours_configured_rate() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("pink.wav");
  let mut engine = Engine::new(&EngineConfig {
    sample_rate: 22_050,
    ..EngineConfig::default()
  });
  render_to_wav(&mut engine, Selector::Pink, 1.0, 0.25, &path).unwrap();
  let (rate, samples) = read_wav(&path).unwrap();
  assert_eq!(rate, 22_050);
  assert_eq!(samples.len(), 5_513);
}

#[test]
fn recording_captures_exactly_what_was_produced() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("take.wav");

  let controls = Arc::new(Controls::new(Selector::ModalDrum, 1.0));
  let state = AudioState::new(controls.clone(), 11_025);
  let mut processor = AudioProcessor::new(&state, Engine::default(), 44_100);

  controls.set_running(true);
  assert_eq!(state.start_recording(Some(path.clone())).unwrap(), path);
  assert!(state.is_recording());

  let produced: Vec<u8> = (0..4_000).map(|_| processor.next_engine_sample()).collect();
  assert_eq!(state.stop_recording().unwrap(), Some(path.clone()));
  assert!(!state.is_recording());
  // Stopping twice is harmless.
  assert_eq!(state.stop_recording().unwrap(), None);

  let (rate, recorded) = read_wav(&path).unwrap();
  assert_eq!(rate, 11_025);
  assert_eq!(recorded, produced);
  assert!(recorded[..PRIME_START_SAMPLES as usize].iter().all(|&s| s == MIDPOINT));
  let stats = SampleStats::from_samples(&recorded[PRIME_START_SAMPLES as usize..]).unwrap();
  assert!(stats.max > 180, "drum hit missing: {stats:?}");
}

#[test]
fn read_wav_rejects_other_formats() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("float.wav");
  let spec = hound::WavSpec {
    channels: 2,
    sample_rate: 48_000,
    bits_per_sample: 32,
    sample_format: hound::SampleFormat::Float,
  };
  let mut writer = hound::WavWriter::create(&path, spec).unwrap();
  writer.write_sample(0.0f32).unwrap();
  writer.write_sample(0.0f32).unwrap();
  writer.finalize().unwrap();
  assert!(read_wav(&path).is_err());
}
