//! Lock-free control cell shared between the control context and the
//! producer.
//!
//! Every field is a plain atomic scalar accessed with `Relaxed` ordering: the
//! producer only needs to observe a recent write eventually, and no update
//! spans more than one field.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::gain::clamp_unit;
use crate::selector::Selector;

#[derive(Debug)]
pub struct Controls {
    /// Raw selector ordinal; may name no generator.
    selector: AtomicU8,
    /// Master gain, stored as f32 bits.
    master_gain_bits: AtomicU32,
    running: AtomicBool,
}

impl Controls {
    pub fn new(selector: Selector, master_gain: f32) -> Self {
        Self {
            selector: AtomicU8::new(selector.index()),
            master_gain_bits: AtomicU32::new(clamp_unit(master_gain).to_bits()),
            running: AtomicBool::new(false),
        }
    }

    /// Takes effect on the next produced sample.
    #[inline]
    pub fn set_selector(&self, selector: Selector) {
        self.selector.store(selector.index(), Ordering::Relaxed);
    }

    /// Store a raw ordinal. Ordinals with no generator play silence.
    #[inline]
    pub fn set_selector_index(&self, index: u8) {
        self.selector.store(index, Ordering::Relaxed);
    }

    #[inline]
    pub fn selector_index(&self) -> u8 {
        self.selector.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn selector(&self) -> Option<Selector> {
        Selector::from_index(self.selector_index())
    }

    /// Clamped to [0, 1]; NaN is stored as 0.
    #[inline]
    pub fn set_master_gain(&self, gain: f32) {
        self.master_gain_bits
            .store(clamp_unit(gain).to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn master_gain(&self) -> f32 {
        f32::from_bits(self.master_gain_bits.load(Ordering::Relaxed))
    }

    /// Add `delta` to the master gain and return the clamped result.
    ///
    /// Read-modify-write is not atomic as a whole; there is a single control
    /// writer.
    pub fn nudge_master_gain(&self, delta: f32) -> f32 {
        let next = clamp_unit(self.master_gain() + delta);
        self.set_master_gain(next);
        next
    }

    #[inline]
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Flip the run flag and return the new state.
    pub fn toggle_running(&self) -> bool {
        !self.running.fetch_xor(true, Ordering::Relaxed)
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new(Selector::White, 1.0)
    }
}
