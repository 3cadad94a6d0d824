use noisebox_core::consts::{MIDPOINT, VIS_RING_MASK, VIS_RING_SIZE};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Fixed-size ring of the most recent engine samples for visualization.
///
/// The audio thread is the only writer. Readers may observe a write index
/// that is slightly ahead of the slot contents; a torn snapshot only shows up
/// as one stale sample on screen.
pub struct ScopeRing {
  slots: Box<[AtomicU8]>,
  write: AtomicUsize,
}

impl ScopeRing {
  pub fn new() -> Self {
    let slots = (0..VIS_RING_SIZE)
      .map(|_| AtomicU8::new(MIDPOINT))
      .collect::<Vec<_>>()
      .into_boxed_slice();
    Self {
      slots,
      write: AtomicUsize::new(0),
    }
  }

  /// Overwrite the oldest slot.
  #[inline]
  pub fn push(&self, sample: u8) {
    let idx = self.write.load(Ordering::Relaxed);
    self.slots[idx].store(sample, Ordering::Relaxed);
    self.write.store((idx + 1) & VIS_RING_MASK, Ordering::Release);
  }

  /// All slots, oldest first.
  pub fn snapshot(&self) -> Vec<u8> {
    let start = self.write.load(Ordering::Acquire);
    (0..VIS_RING_SIZE)
      .map(|i| self.slots[(start + i) & VIS_RING_MASK].load(Ordering::Relaxed))
      .collect()
  }

  pub fn capacity(&self) -> usize {
    VIS_RING_SIZE
  }
}

impl Default for ScopeRing {
  fn default() -> Self {
    Self::new()
  }
}
