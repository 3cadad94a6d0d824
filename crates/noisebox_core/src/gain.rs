//! Per-selector loudness normalization.

use std::collections::HashMap;

use crate::consts::DEFAULT_GAIN;
use crate::selector::Selector;

/// Immutable selector → multiplier mapping, fixed at engine construction.
///
/// Lookups are a dense array index; selectors without an entry fall back to
/// [`DEFAULT_GAIN`].
#[derive(Debug, Clone, PartialEq)]
pub struct GainTable {
    gains: [Option<f32>; Selector::COUNT],
}

impl GainTable {
    /// The tuned table shipped with every generator.
    pub fn builtin() -> Self {
        let mut gains = [None; Selector::COUNT];
        for &s in Selector::ALL {
            gains[s.index() as usize] = Some(s.builtin_gain());
        }
        Self { gains }
    }

    /// A table with no entries; every lookup yields the default.
    pub fn empty() -> Self {
        Self {
            gains: [None; Selector::COUNT],
        }
    }

    /// Replace one entry. The value is clamped to [0, 1]; NaN becomes 0.
    pub fn with_override(mut self, selector: Selector, gain: f32) -> Self {
        self.gains[selector.index() as usize] = Some(clamp_unit(gain));
        self
    }

    pub fn with_overrides(mut self, overrides: &HashMap<Selector, f32>) -> Self {
        for (&selector, &gain) in overrides {
            self = self.with_override(selector, gain);
        }
        self
    }

    #[inline]
    pub fn gain(&self, selector: Selector) -> f32 {
        self.gains[selector.index() as usize].unwrap_or(DEFAULT_GAIN)
    }
}

impl Default for GainTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
#[inline]
pub(crate) fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
