use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Host, HostId, SizedSample};
use crossbeam_channel::Sender;
use hound::WavWriter;
use noisebox_core::consts::MIDPOINT;
use noisebox_core::{Controls, Engine};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::meter::{AudioBudgetMeter, AudioBudgetSnapshot};
use crate::render::{to_wav_sample, wav_spec};
use crate::scope::ScopeRing;

/// Midpoint samples emitted before the first generated sample after play.
pub const PRIME_START_SAMPLES: u32 = 200;
/// Midpoint samples emitted after pause so the output rests at 128.
pub const PRIME_STOP_SAMPLES: u32 = 400;

/// WAV writer fed from the audio thread.
///
/// The first write error is kept instead of dropped; later samples are
/// discarded so a failing disk is only hit once.
pub(crate) struct Recording<W: Write + Seek = BufWriter<File>> {
  writer: WavWriter<W>,
  error: Option<hound::Error>,
}

impl<W: Write + Seek> Recording<W> {
  pub(crate) fn new(writer: WavWriter<W>) -> Self {
    Self {
      writer,
      error: None,
    }
  }

  #[inline]
  pub(crate) fn write(&mut self, sample: u8) {
    if self.error.is_some() {
      return;
    }
    if let Err(e) = self.writer.write_sample(to_wav_sample(sample)) {
      self.error = Some(e);
    }
  }

  pub(crate) fn error(&self) -> Option<&hound::Error> {
    self.error.as_ref()
  }

  pub(crate) fn finalize(self) -> hound::Result<()> {
    self.writer.finalize()
  }
}

// ============================================================================
// Rate conversion
// ============================================================================

/// Zero-order hold from the engine rate to the device rate.
///
/// Each device frame asks how many engine samples fall due; the last one is
/// held until the next is due, the way a DAC latches its input.
#[derive(Debug, Clone)]
pub struct RateConverter {
  ratio: f64,
  phase: f64,
}

impl RateConverter {
  pub fn new(engine_rate: u32, device_rate: u32) -> Self {
    let ratio = engine_rate as f64 / device_rate.max(1) as f64;
    Self {
      ratio,
      // The very first frame always produces a sample.
      phase: (1.0 - ratio).max(0.0),
    }
  }

  /// Engine samples to produce for the next device frame.
  #[inline]
  pub fn samples_due(&mut self) -> u32 {
    self.phase += self.ratio;
    let due = self.phase.floor();
    self.phase -= due;
    due as u32
  }
}

/// Map an engine byte to a float device sample in [-1, 1).
#[inline]
pub fn to_device_sample(sample: u8) -> f32 {
  (sample as f32 - MIDPOINT as f32) / MIDPOINT as f32
}

// ============================================================================
// AudioState - control side
// ============================================================================

/// State shared between the control context and the audio callback.
pub struct AudioState {
  controls: Arc<Controls>,
  scope: Arc<ScopeRing>,
  /// Recording writer - shared with audio thread
  recording_writer: Arc<Mutex<Option<Recording>>>,
  recording_path: Mutex<Option<PathBuf>>,
  /// Written by audio thread, read by control context
  budget_meter: Arc<AudioBudgetMeter>,
  engine_rate: u32,
}

impl AudioState {
  pub fn new(controls: Arc<Controls>, engine_rate: u32) -> Self {
    Self {
      controls,
      scope: Arc::new(ScopeRing::new()),
      recording_writer: Arc::new(Mutex::new(None)),
      recording_path: Mutex::new(None),
      budget_meter: Arc::new(AudioBudgetMeter::new()),
      engine_rate,
    }
  }

  pub fn controls(&self) -> &Arc<Controls> {
    &self.controls
  }

  pub fn engine_rate(&self) -> u32 {
    self.engine_rate
  }

  pub fn scope_snapshot(&self) -> Vec<u8> {
    self.scope.snapshot()
  }

  pub fn take_budget_snapshot(&self, device_rate: u32) -> AudioBudgetSnapshot {
    self.budget_meter.take_snapshot(device_rate)
  }

  /// Start writing produced engine samples to an 8-bit WAV. Without a path a
  /// timestamped file in the working directory is used.
  pub fn start_recording(&self, path: Option<PathBuf>) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| {
      PathBuf::from(format!(
        "recording_{}.wav",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
      ))
    });

    let writer = WavWriter::create(&path, wav_spec(self.engine_rate))
      .with_context(|| format!("failed to start recording to {}", path.display()))?;
    // Replacing a live writer finalizes it on drop.
    *self.recording_writer.lock() = Some(Recording::new(writer));
    *self.recording_path.lock() = Some(path.clone());
    tracing::info!(path = %path.display(), "recording started");

    Ok(path)
  }

  pub fn stop_recording(&self) -> Result<Option<PathBuf>> {
    let recording = self.recording_writer.lock().take();
    let path = self.recording_path.lock().take();

    if let Some(rec) = recording {
      if let Some(err) = rec.error() {
        tracing::warn!(
          path = ?path.as_deref(),
          %err,
          "recording write failed; the file is truncated"
        );
      }
      rec.finalize().context("failed to finalize recording")?;
    }
    if let Some(p) = &path {
      tracing::info!(path = %p.display(), "recording stopped");
    }

    Ok(path)
  }

  pub fn is_recording(&self) -> bool {
    self.recording_path.lock().is_some()
  }
}

// ============================================================================
// AudioProcessor - audio thread side
// ============================================================================

/// Owns the engine on the audio thread and turns device frames into engine
/// samples.
pub struct AudioProcessor {
  engine: Engine,
  controls: Arc<Controls>,
  scope: Arc<ScopeRing>,
  recording_writer: Arc<Mutex<Option<Recording>>>,
  converter: RateConverter,
  held: u8,
  prime_remaining: u32,
  was_running: bool,
}

impl AudioProcessor {
  pub fn new(state: &AudioState, engine: Engine, device_rate: u32) -> Self {
    let converter = RateConverter::new(engine.sample_rate(), device_rate);
    Self {
      engine,
      controls: state.controls.clone(),
      scope: state.scope.clone(),
      recording_writer: state.recording_writer.clone(),
      converter,
      held: MIDPOINT,
      prime_remaining: 0,
      was_running: false,
    }
  }

  /// One sample at the engine rate. The engine is only advanced while
  /// running and not priming, so a pause never moves any generator.
  pub fn next_engine_sample(&mut self) -> u8 {
    let running = self.controls.is_running();
    if running != self.was_running {
      self.was_running = running;
      self.prime_remaining = if running {
        PRIME_START_SAMPLES
      } else {
        PRIME_STOP_SAMPLES
      };
    }

    let sample = if self.prime_remaining > 0 {
      self.prime_remaining -= 1;
      MIDPOINT
    } else if running {
      self.engine.next_sample(&self.controls)
    } else {
      MIDPOINT
    };

    self.scope.push(sample);

    // Never block the audio thread on the control side
    if let Some(mut guard) = self.recording_writer.try_lock()
      && let Some(ref mut recording) = *guard
    {
      recording.write(sample);
    }

    sample
  }

  /// One device frame as a float sample.
  #[inline]
  pub fn process_frame(&mut self) -> f32 {
    for _ in 0..self.converter.samples_due() {
      self.held = self.next_engine_sample();
    }
    to_device_sample(self.held)
  }
}

// ============================================================================
// Device
// ============================================================================

/// What the output stream ended up running at.
#[derive(Debug, Clone)]
pub struct StreamInfo {
  pub device_name: String,
  pub device_rate: u32,
  pub channels: u16,
  pub sample_format: cpal::SampleFormat,
}

pub fn get_host_by_preference() -> Host {
  #[cfg(target_os = "windows")]
  {
    if let Ok(wasapi) = cpal::host_from_id(HostId::Wasapi) {
      tracing::debug!("using WASAPI");
      return wasapi;
    }
  }

  #[cfg(target_os = "macos")]
  {
    if let Ok(coreaudio_host) = cpal::host_from_id(HostId::CoreAudio) {
      tracing::debug!("using CoreAudio");
      return coreaudio_host;
    }
  }

  #[cfg(target_os = "linux")]
  {
    if let Ok(alsa_host) = cpal::host_from_id(HostId::Alsa) {
      tracing::debug!("using ALSA");
      return alsa_host;
    }
  }

  let default_host = cpal::default_host();
  tracing::debug!("using default host: {:?}", default_host.id());
  default_host
}

/// Open the default output device and start pulling samples from `engine`.
pub fn run_audio_thread(
  state: &AudioState,
  engine: Engine,
  error_tx: Sender<String>,
) -> Result<(cpal::Stream, StreamInfo)> {
  let host = get_host_by_preference();
  let device = host
    .default_output_device()
    .ok_or_else(|| anyhow::anyhow!("No audio output device found"))?;
  let config = device
    .default_output_config()
    .context("failed to get default output config")?;

  let info = StreamInfo {
    device_name: device
      .description()
      .map(|d| d.name().to_owned())
      .unwrap_or_else(|_| "unknown".to_string()),
    device_rate: config.sample_rate(),
    channels: config.channels(),
    sample_format: config.sample_format(),
  };
  tracing::info!(
    device = %info.device_name,
    rate = info.device_rate,
    channels = info.channels,
    format = ?info.sample_format,
    engine_rate = engine.sample_rate(),
    "opening output stream"
  );

  let processor = AudioProcessor::new(state, engine, info.device_rate);
  let meter = state.budget_meter.clone();
  let stream_config: cpal::StreamConfig = config.into();
  let stream = build_output_stream(
    &device,
    &stream_config,
    info.sample_format,
    processor,
    meter,
    error_tx,
  )?;

  stream.play().context("failed to start output stream")?;
  Ok((stream, info))
}

fn build_output_stream(
  device: &cpal::Device,
  config: &cpal::StreamConfig,
  sample_format: cpal::SampleFormat,
  processor: AudioProcessor,
  meter: Arc<AudioBudgetMeter>,
  error_tx: Sender<String>,
) -> Result<cpal::Stream> {
  match sample_format {
    cpal::SampleFormat::I8 => make_stream::<i8>(device, config, processor, meter, error_tx),
    cpal::SampleFormat::I16 => make_stream::<i16>(device, config, processor, meter, error_tx),
    cpal::SampleFormat::I32 => make_stream::<i32>(device, config, processor, meter, error_tx),
    cpal::SampleFormat::F32 => make_stream::<f32>(device, config, processor, meter, error_tx),
    cpal::SampleFormat::U8 => make_stream::<u8>(device, config, processor, meter, error_tx),
    cpal::SampleFormat::U16 => make_stream::<u16>(device, config, processor, meter, error_tx),
    _ => Err(anyhow::anyhow!(
      "Unsupported output sample format: {:?}",
      sample_format
    )),
  }
}

pub fn make_stream<T>(
  device: &cpal::Device,
  config: &cpal::StreamConfig,
  mut processor: AudioProcessor,
  meter: Arc<AudioBudgetMeter>,
  error_tx: Sender<String>,
) -> Result<cpal::Stream>
where
  T: SizedSample + FromSample<f32>,
{
  let num_channels = config.channels as usize;

  let err_fn = move |err: cpal::StreamError| {
    tracing::error!(%err, "output stream error");
    let _ = error_tx.try_send(err.to_string());
  };

  let stream = device
    .build_output_stream(
      config,
      move |output: &mut [T], _info: &cpal::OutputCallbackInfo| {
        profiling::scope!("audio_callback");

        let callback_start = Instant::now();

        for frame in output.chunks_mut(num_channels) {
          let sample = T::from_sample(processor.process_frame());
          for s in frame.iter_mut() {
            *s = sample;
          }
        }

        meter.record_callback(output.len() / num_channels.max(1), callback_start.elapsed());
      },
      err_fn,
      None,
    )
    .context("failed to build output stream")?;

  Ok(stream)
}

#[cfg(test)]
mod tests {
  use super::*;
  use noisebox_core::{EngineConfig, Selector};

  /// Sink that refuses any byte past `limit`, counting refused writes.
  struct FullDisk {
    data: Vec<u8>,
    pos: usize,
    limit: usize,
    refused: Arc<std::sync::atomic::AtomicUsize>,
  }

  impl Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
      if self.pos + buf.len() > self.limit {
        self
          .refused
          .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        return Err(std::io::Error::other("disk full"));
      }
      let end = self.pos + buf.len();
      if self.data.len() < end {
        self.data.resize(end, 0);
      }
      self.data[self.pos..end].copy_from_slice(buf);
      self.pos = end;
      Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  impl Seek for FullDisk {
    fn seek(&mut self, to: std::io::SeekFrom) -> std::io::Result<u64> {
      let pos = match to {
        std::io::SeekFrom::Start(p) => p as i64,
        std::io::SeekFrom::Current(d) => self.pos as i64 + d,
        std::io::SeekFrom::End(d) => self.data.len() as i64 + d,
      };
      self.pos = pos.max(0) as usize;
      Ok(self.pos as u64)
    }
  }

  #[test]
  fn test_recording_keeps_first_write_error() {
    let refused = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let sink = FullDisk {
      data: Vec::new(),
      pos: 0,
      limit: 64,
      refused: refused.clone(),
    };
    let mut rec = Recording::new(WavWriter::new(sink, wav_spec(11_025)).unwrap());
    for _ in 0..100 {
      rec.write(200);
    }

    match rec.error() {
      Some(hound::Error::IoError(e)) => assert_eq!(e.to_string(), "disk full"),
      other => panic!("expected the disk error to be kept, got {other:?}"),
    }
    assert_eq!(
      refused.load(std::sync::atomic::Ordering::Relaxed),
      1,
      "writes should stop after the first failure"
    );
  }

  #[test]
  fn test_recording_without_errors() {
    let mut rec =
      Recording::new(WavWriter::new(std::io::Cursor::new(Vec::new()), wav_spec(11_025)).unwrap());
    for s in 0..=255u8 {
      rec.write(s);
    }
    assert!(rec.error().is_none());
    rec.finalize().unwrap();
  }

  fn processor(controls: Arc<Controls>, device_rate: u32) -> (AudioState, AudioProcessor) {
    let state = AudioState::new(controls, 11_025);
    let processor = AudioProcessor::new(&state, Engine::default(), device_rate);
    (state, processor)
  }

  #[test]
  fn test_rate_converter_integer_ratio() {
    let mut conv = RateConverter::new(11_025, 44_100);
    let due: Vec<u32> = (0..8).map(|_| conv.samples_due()).collect();
    assert_eq!(due, vec![1, 0, 0, 0, 1, 0, 0, 0]);
  }

  #[test]
  fn test_rate_converter_keeps_long_run_rate() {
    let mut conv = RateConverter::new(11_025, 48_000);
    let total: u32 = (0..48_000).map(|_| conv.samples_due()).sum();
    assert!((11_024..=11_026).contains(&total), "{total}");

    let mut up = RateConverter::new(22_050, 11_025);
    assert!((0..100).all(|_| up.samples_due() == 2));
  }

  #[test]
  fn test_device_sample_mapping() {
    assert_eq!(to_device_sample(128), 0.0);
    assert_eq!(to_device_sample(0), -1.0);
    assert!(to_device_sample(255) < 1.0);
  }

  #[test]
  fn test_paused_output_is_midpoint_and_engine_does_not_advance() {
    let controls = Arc::new(Controls::new(Selector::Saw, 1.0));
    let (_state, mut proc) = processor(controls.clone(), 11_025);
    for _ in 0..1_000 {
      assert_eq!(proc.next_engine_sample(), MIDPOINT);
    }

    controls.set_running(true);
    let primed: Vec<u8> = (0..PRIME_START_SAMPLES)
      .map(|_| proc.next_engine_sample())
      .collect();
    assert!(primed.iter().all(|&s| s == MIDPOINT));

    // The saw starts from its first sample, as if nothing happened before.
    let mut reference = Engine::new(&EngineConfig::default());
    for _ in 0..500 {
      assert_eq!(proc.next_engine_sample(), reference.produce(Selector::Saw, 1.0));
    }
  }

  #[test]
  fn test_stop_priming_then_silence() {
    let controls = Arc::new(Controls::new(Selector::White, 1.0));
    let (_state, mut proc) = processor(controls.clone(), 11_025);
    controls.set_running(true);
    for _ in 0..PRIME_START_SAMPLES + 50 {
      proc.next_engine_sample();
    }
    controls.set_running(false);
    for _ in 0..PRIME_STOP_SAMPLES * 2 {
      assert_eq!(proc.next_engine_sample(), MIDPOINT);
    }
  }

  #[test]
  fn test_scope_sees_engine_samples() {
    let controls = Arc::new(Controls::new(Selector::Square, 1.0));
    let (state, mut proc) = processor(controls.clone(), 44_100);
    controls.set_running(true);
    let frames = (PRIME_START_SAMPLES as usize + 1_024) * 4;
    let device: Vec<f32> = (0..frames).map(|_| proc.process_frame()).collect();
    let scope = state.scope_snapshot();
    assert!(scope.iter().all(|&s| s != MIDPOINT));
    // Each engine sample is held for four device frames.
    for chunk in device[device.len() - 64..].chunks_exact(4) {
      assert!(chunk.iter().all(|&v| v == chunk[0]));
    }
  }
}
