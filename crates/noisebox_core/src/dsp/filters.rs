//! Filter cores shared between generators.
//!
//! Both filters hard-clamp their state every sample. There is no error
//! channel above the producer loop, so a runaway resonance must saturate
//! here instead of growing without bound.

use std::f32::consts::PI;

use crate::dsp::utils::hz_to_step;

/// Chamberlin state-variable filter, band-pass tap.
#[derive(Debug, Default, Clone, Copy)]
pub struct StateVariable {
    low: f32,
    band: f32,
}

impl StateVariable {
    const STATE_LIMIT: f32 = 8.0;

    /// Run one sample and return the band-pass output.
    ///
    /// `damping` is 1/Q: smaller values ring longer.
    #[inline]
    pub fn bandpass(&mut self, input: f32, center_hz: f32, damping: f32, sample_rate: f32) -> f32 {
        let f = 2.0 * (PI * center_hz / sample_rate).sin();
        self.low += f * self.band;
        let high = input - self.low - damping * self.band;
        self.band += f * high;

        self.low = self.low.clamp(-Self::STATE_LIMIT, Self::STATE_LIMIT);
        self.band = self.band.clamp(-Self::STATE_LIMIT, Self::STATE_LIMIT);
        self.band
    }
}

/// Two-pole resonator `y[n] = 2r·cos(w)·y[n-1] - r²·y[n-2] + x[n]`.
#[derive(Debug, Clone, Copy)]
pub struct Resonator {
    y1: f32,
    y2: f32,
    limit: f32,
}

impl Resonator {
    pub const fn new(limit: f32) -> Self {
        Self {
            y1: 0.0,
            y2: 0.0,
            limit,
        }
    }

    /// Run one sample with pole radius `r` at `center_hz`. The returned value
    /// and the stored state are clamped to `±limit`.
    #[inline]
    pub fn process(&mut self, input: f32, center_hz: f32, r: f32, sample_rate: f32) -> f32 {
        let w = hz_to_step(center_hz, sample_rate);
        let a1 = 2.0 * r * w.cos();
        let a2 = -r * r;
        let y = (a1 * self.y1 + a2 * self.y2 + input).clamp(-self.limit, self.limit);
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}
