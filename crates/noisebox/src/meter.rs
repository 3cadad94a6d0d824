use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Output-callback load over one reporting window.
///
/// Usage is callback time divided by the playback time of the frames it
/// filled, so 1.0 means the callback only just kept up with the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AudioBudgetSnapshot {
  pub frames: u64,
  pub busy_ns: u64,
  pub avg_ns_per_frame: f64,
  pub avg_usage: f64,
  /// Slowest single callback, per frame.
  pub peak_ns_per_frame: f64,
  pub peak_usage: f64,
}

impl AudioBudgetSnapshot {
  /// At least one callback took longer than the audio it produced.
  pub fn is_overrun(&self) -> bool {
    self.peak_usage > 1.0
  }
}

/// Written by the output callback, drained by the control loop.
#[derive(Debug, Default)]
pub struct AudioBudgetMeter {
  frames: AtomicU64,
  busy_ns: AtomicU64,
  // ns per frame in 32.32 fixed point
  peak_q32: AtomicU64,
}

impl AudioBudgetMeter {
  pub const fn new() -> Self {
    Self {
      frames: AtomicU64::new(0),
      busy_ns: AtomicU64::new(0),
      peak_q32: AtomicU64::new(0),
    }
  }

  /// Account one callback that filled `frames` device frames.
  #[inline(always)]
  pub fn record_callback(&self, frames: usize, elapsed: Duration) {
    if frames == 0 {
      return;
    }
    let busy = elapsed.as_nanos().min(u64::MAX as u128) as u64;
    self.frames.fetch_add(frames as u64, Ordering::Relaxed);
    self.busy_ns.fetch_add(busy, Ordering::Relaxed);

    let per_frame = (((busy as u128) << 32) / frames as u128).min(u64::MAX as u128) as u64;
    self.peak_q32.fetch_max(per_frame, Ordering::Relaxed);
  }

  /// Drain the window and rate it against the device frame period.
  pub fn take_snapshot(&self, device_rate: u32) -> AudioBudgetSnapshot {
    let frames = self.frames.swap(0, Ordering::Relaxed);
    let busy_ns = self.busy_ns.swap(0, Ordering::Relaxed);
    let peak_q32 = self.peak_q32.swap(0, Ordering::Relaxed);

    let frame_period_ns = 1e9 / device_rate.max(1) as f64;
    let avg_ns_per_frame = if frames > 0 {
      busy_ns as f64 / frames as f64
    } else {
      0.0
    };
    let peak_ns_per_frame = peak_q32 as f64 / (1u64 << 32) as f64;

    AudioBudgetSnapshot {
      frames,
      busy_ns,
      avg_ns_per_frame,
      avg_usage: avg_ns_per_frame / frame_period_ns,
      peak_ns_per_frame,
      peak_usage: peak_ns_per_frame / frame_period_ns,
    }
  }
}
