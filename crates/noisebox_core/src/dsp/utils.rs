use std::f32::consts::TAU;

/// Per-sample phase increment, in radians, for a tone at `freq_hz`.
#[inline]
pub fn hz_to_step(freq_hz: f32, sample_rate: f32) -> f32 {
    TAU * freq_hz / sample_rate
}

/// Wrap a value into `range` by adding or subtracting whole spans.
///
/// Phase accumulators only ever move by less than a period per sample, so in
/// practice the loops run at most once; no `%` is applied to the raw float.
pub fn wrap<T>(range: std::ops::Range<T>, mut val: T) -> T
where
    T: std::ops::Sub<Output = T>
        + std::ops::AddAssign
        + std::cmp::PartialOrd
        + std::ops::SubAssign
        + Copy,
{
    let span = range.end - range.start;
    while val >= range.end {
        val -= span;
    }
    while val < range.start {
        val += span;
    }
    val
}

/// Map a unipolar LFO reading `0.5 + 0.5 * sin(x)` into `[lo, hi]`.
#[inline]
pub fn sweep(lo: f32, hi: f32, phase: f32) -> f32 {
    lo + (hi - lo) * (0.5 + 0.5 * phase.sin())
}

/// Scale a bipolar value to a centred 8-bit sample.
///
/// Truncates toward zero (NaN becomes 0) and limits the result to the signed
/// 8-bit range, which is the contract every generator output obeys.
#[inline]
pub fn to_centered(value: f32, scale: f32) -> i32 {
    ((value * scale) as i32).clamp(-128, 127)
}

/// Radian phase accumulator wrapped into [0, 2π).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Phase(f32);

impl Phase {
    pub const fn new(radians: f32) -> Self {
        Self(radians)
    }

    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Advance by `step` radians and return the wrapped phase.
    #[inline]
    pub fn advance(&mut self, step: f32) -> f32 {
        self.0 = wrap(0.0..TAU, self.0 + step);
        self.0
    }

    /// Advance by the increment for `freq_hz`.
    #[inline]
    pub fn advance_hz(&mut self, freq_hz: f32, sample_rate: f32) -> f32 {
        self.advance(hz_to_step(freq_hz, sample_rate))
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0.0;
    }
}

/// Normalized phase accumulator wrapped into [0, 1), used by the
/// sawtooth/pulse family.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Ramp(f32);

impl Ramp {
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Advance by `freq_hz / sample_rate`. Returns `true` when the ramp
    /// completed a cycle on this step.
    #[inline]
    pub fn advance(&mut self, freq_hz: f32, sample_rate: f32) -> bool {
        self.0 += freq_hz / sample_rate;
        if self.0 >= 1.0 {
            self.0 = wrap(0.0..1.0, self.0);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0.0;
    }

    /// Naive sawtooth in [-1, 1).
    #[inline]
    pub fn saw(self) -> f32 {
        2.0 * self.0 - 1.0
    }

    /// Pulse with the given duty cycle.
    #[inline]
    pub fn pulse(self, duty: f32) -> f32 {
        if self.0 < duty { 1.0 } else { -1.0 }
    }
}
