//! Dispatch and gain stage.

use crate::bank::GeneratorBank;
use crate::config::EngineConfig;
use crate::consts::MIDPOINT;
use crate::controls::Controls;
use crate::gain::{GainTable, clamp_unit};
use crate::selector::Selector;

/// Scale a raw centered sample and re-center it on [`MIDPOINT`].
///
/// `trunc(raw * gain * master) + 128`, clamped to the unsigned 8-bit range.
#[inline]
pub fn apply_gain(raw: i32, gain: f32, master_gain: f32) -> u8 {
    let scaled = (raw as f32 * gain * master_gain) as i32;
    (scaled + MIDPOINT as i32).clamp(0, 255) as u8
}

/// Owns every generator and turns a selector into one output byte.
///
/// The engine is confined to the producer; the control context talks to it
/// only through [`Controls`].
pub struct Engine {
    bank: GeneratorBank,
    gains: GainTable,
    sample_rate: u32,
    seed: u64,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        tracing::debug!(
            sample_rate = config.sample_rate,
            seed = config.seed,
            overrides = config.gains.len(),
            "building generator bank"
        );
        Self::with_gains(config.sample_rate, config.seed, config.gain_table())
    }

    pub fn with_gains(sample_rate: u32, seed: u64, gains: GainTable) -> Self {
        Self {
            bank: GeneratorBank::new(sample_rate as f32, seed),
            gains,
            sample_rate,
            seed,
        }
    }

    /// Advance `selector`'s generator and return the raw centered sample.
    #[inline]
    pub fn produce_raw(&mut self, selector: Selector) -> i32 {
        self.bank.next_raw(selector)
    }

    /// Produce the next output byte for `selector`. Only that generator
    /// advances.
    #[profiling::function]
    #[inline]
    pub fn produce(&mut self, selector: Selector, master_gain: f32) -> u8 {
        let raw = self.bank.next_raw(selector);
        apply_gain(raw, self.gains.gain(selector), clamp_unit(master_gain))
    }

    /// Like [`Engine::produce`] for a raw ordinal. Ordinals with no generator
    /// yield the midpoint and advance nothing.
    #[inline]
    pub fn produce_index(&mut self, index: u8, master_gain: f32) -> u8 {
        match Selector::from_index(index) {
            Some(selector) => self.produce(selector, master_gain),
            None => MIDPOINT,
        }
    }

    /// Producer step: read the control cell and produce one byte.
    #[inline]
    pub fn next_sample(&mut self, controls: &Controls) -> u8 {
        self.produce_index(controls.selector_index(), controls.master_gain())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn gains(&self) -> &GainTable {
        &self.gains
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
