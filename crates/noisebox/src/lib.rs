//! Audio host for the noisebox engine.
//!
//! Paces the engine from a cpal output callback, mirrors produced samples into
//! a scope ring and an optional WAV recording, and measures how much of the
//! real-time budget the callback spends.

#![deny(clippy::all)]

pub mod audio;
pub mod cursor;
pub mod meter;
pub mod render;
pub mod scope;

use anyhow::Result;
use cpal::traits::StreamTrait;
use crossbeam_channel::Receiver;
use noisebox_core::{Controls, Engine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use audio::{AudioProcessor, AudioState, RateConverter, StreamInfo};
pub use cursor::TrackCursor;
pub use meter::{AudioBudgetMeter, AudioBudgetSnapshot};
pub use render::{read_wav, render_samples, render_to_wav, write_wav};
pub use scope::ScopeRing;

const STREAM_ERROR_CAPACITY: usize = 64;

/// A running output stream driving one engine.
///
/// The engine moves onto the audio thread; everything else goes through the
/// shared [`Controls`].
pub struct Player {
  state: Arc<AudioState>,
  stream: cpal::Stream,
  info: StreamInfo,
  errors: Receiver<String>,
}

impl Player {
  /// Open the default device and start playing.
  pub fn start(engine: Engine, controls: Arc<Controls>) -> Result<Self> {
    let state = Arc::new(AudioState::new(controls, engine.sample_rate()));
    let (error_tx, errors) = crossbeam_channel::bounded(STREAM_ERROR_CAPACITY);
    let (stream, info) = audio::run_audio_thread(&state, engine, error_tx)?;
    state.controls().set_running(true);
    Ok(Self {
      state,
      stream,
      info,
      errors,
    })
  }

  pub fn info(&self) -> &StreamInfo {
    &self.info
  }

  pub fn controls(&self) -> &Arc<Controls> {
    self.state.controls()
  }

  pub fn is_playing(&self) -> bool {
    self.controls().is_running()
  }

  /// Pause or resume. Generators keep their state while paused.
  pub fn toggle_playing(&self) -> bool {
    let playing = self.controls().toggle_running();
    tracing::info!(playing, "transport");
    playing
  }

  pub fn scope_snapshot(&self) -> Vec<u8> {
    self.state.scope_snapshot()
  }

  pub fn take_budget_snapshot(&self) -> AudioBudgetSnapshot {
    self.state.take_budget_snapshot(self.info.device_rate)
  }

  pub fn start_recording(&self, path: Option<PathBuf>) -> Result<PathBuf> {
    self.state.start_recording(path)
  }

  pub fn stop_recording(&self) -> Result<Option<PathBuf>> {
    self.state.stop_recording()
  }

  pub fn is_recording(&self) -> bool {
    self.state.is_recording()
  }

  /// Errors reported by the device since the last call.
  pub fn drain_errors(&self) -> Vec<String> {
    self.errors.try_iter().collect()
  }

  /// Pause, let the output settle at the midpoint, then close the stream.
  pub fn stop(self) -> Result<()> {
    self.controls().set_running(false);
    let settle = audio::PRIME_STOP_SAMPLES as f64 / self.state.engine_rate() as f64;
    std::thread::sleep(Duration::from_secs_f64(settle) + Duration::from_millis(50));
    if let Err(err) = self.stream.pause() {
      tracing::warn!(%err, "failed to pause output stream");
    }
    self.state.stop_recording()?;
    Ok(())
  }
}
