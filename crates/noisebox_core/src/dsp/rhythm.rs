//! Step-pattern gates driving a decaying envelope on a sine carrier.

use super::Generator;
use super::utils::{Phase, hz_to_step, to_centered};

pub const STEPS: usize = 16;

/// Counts down to the next step boundary. `tick` returns `true` on the sample
/// that starts a new step.
#[derive(Debug, Clone, Copy)]
struct StepClock {
    remaining: i32,
    period: i32,
}

impl StepClock {
    fn new(period: i32) -> Self {
        Self {
            remaining: 0,
            period: period.max(1),
        }
    }

    #[inline]
    fn tick(&mut self) -> bool {
        self.remaining -= 1;
        if self.remaining <= 0 {
            self.remaining = self.period;
            true
        } else {
            false
        }
    }
}

/// Sixteen-step pattern clocked at eight steps per second. A hit resets the
/// envelope to 1 and it then decays geometrically every sample.
pub struct EuclidGate {
    pattern: [bool; STEPS],
    step: usize,
    clock: StepClock,
    carrier: Phase,
    carrier_step: f32,
    decay: f32,
    env: f32,
    applied: f32,
}

impl EuclidGate {
    pub const TRESILLO: [bool; STEPS] = pattern(*b"1001001010010100");
    pub const SEVEN_SIXTEEN: [bool; STEPS] = pattern(*b"1010101010101000");

    pub fn new(pattern: [bool; STEPS], carrier_hz: f32, decay: f32, sample_rate: f32) -> Self {
        Self {
            pattern,
            step: 0,
            clock: StepClock::new((sample_rate / 8.0) as i32),
            carrier: Phase::default(),
            carrier_step: hz_to_step(carrier_hz, sample_rate),
            decay,
            env: 0.0,
            applied: 0.0,
        }
    }

    /// 1 kHz blips on a 3-3-2-3-2-3 grouping.
    pub fn tresillo(sample_rate: f32) -> Self {
        Self::new(Self::TRESILLO, 1000.0, 0.995, sample_rate)
    }

    /// Seven 1.6 kHz hits on alternate steps, then a three-step rest.
    pub fn seven_sixteen(sample_rate: f32) -> Self {
        Self::new(Self::SEVEN_SIXTEEN, 1600.0, 0.994, sample_rate)
    }

    /// Envelope value multiplied into the most recent sample.
    pub fn applied_envelope(&self) -> f32 {
        self.applied
    }

    /// Samples per pattern step.
    pub fn step_period(&self) -> usize {
        self.clock.period as usize
    }

    pub fn pattern(&self) -> &[bool; STEPS] {
        &self.pattern
    }
}

impl Generator for EuclidGate {
    fn next_sample(&mut self) -> i32 {
        if self.clock.tick() {
            if self.pattern[self.step] {
                self.env = 1.0;
            }
            self.step = (self.step + 1) & (STEPS - 1);
        }
        let c = self.carrier.advance(self.carrier_step);
        self.applied = self.env;
        let v = self.env * c.sin();
        self.env *= self.decay;
        to_centered(v, 127.0)
    }
}

/// Two gates at three and four hits per second sharing one 1.2 kHz carrier.
pub struct Polyrhythm {
    clock_a: StepClock,
    clock_b: StepClock,
    env_a: f32,
    env_b: f32,
    carrier: Phase,
    carrier_step: f32,
}

impl Polyrhythm {
    const DECAY: f32 = 0.994;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            clock_a: StepClock::new((sample_rate / 3.0) as i32),
            clock_b: StepClock::new((sample_rate / 4.0) as i32),
            env_a: 0.0,
            env_b: 0.0,
            carrier: Phase::default(),
            carrier_step: hz_to_step(1200.0, sample_rate),
        }
    }
}

impl Generator for Polyrhythm {
    fn next_sample(&mut self) -> i32 {
        if self.clock_a.tick() {
            self.env_a = 1.0;
        }
        if self.clock_b.tick() {
            self.env_b = 1.0;
        }
        let c = self.carrier.advance(self.carrier_step);
        let v = (self.env_a + self.env_b) * 0.5 * c.sin();
        self.env_a *= Self::DECAY;
        self.env_b *= Self::DECAY;
        to_centered(v, 127.0)
    }
}

const fn pattern(steps: [u8; STEPS]) -> [bool; STEPS] {
    let mut out = [false; STEPS];
    let mut i = 0;
    while i < STEPS {
        out[i] = steps[i] == b'1';
        i += 1;
    }
    out
}
