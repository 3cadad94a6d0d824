//! Physical-model and resonant generators.

use super::Generator;
use super::filters::Resonator;
use super::random::NoiseSource;
use super::utils::{Phase, hz_to_step, to_centered};
use std::f32::consts::TAU;

const KS_MAX_LEN: usize = 256;

/// Karplus-Strong plucked string at 196 Hz, re-plucked every 0.8 s.
pub struct Karplus {
    buf: Box<[f32; KS_MAX_LEN]>,
    len: usize,
    idx: usize,
    repluck: i32,
    repluck_period: i32,
    rng: NoiseSource,
}

impl Karplus {
    const PITCH_HZ: f32 = 196.0;
    const DAMPING: f32 = 0.996;
    const REPLUCK_SECONDS: f32 = 0.8;

    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        let len = ((sample_rate / Self::PITCH_HZ) as usize).clamp(8, KS_MAX_LEN);
        let repluck_period = (Self::REPLUCK_SECONDS * sample_rate) as i32;
        let mut ks = Self {
            buf: Box::new([0.0; KS_MAX_LEN]),
            len,
            idx: 0,
            repluck: repluck_period,
            repluck_period,
            rng,
        };
        ks.pluck();
        ks
    }

    fn pluck(&mut self) {
        for v in &mut self.buf[..self.len] {
            *v = self.rng.range(-128, 128) as f32 / 256.0;
        }
    }

    /// Active part of the delay line.
    pub fn buffer(&self) -> &[f32] {
        &self.buf[..self.len]
    }

    pub fn period(&self) -> usize {
        self.len
    }

    pub fn repluck_period(&self) -> usize {
        self.repluck_period as usize
    }
}

impl Generator for Karplus {
    fn next_sample(&mut self) -> i32 {
        self.repluck -= 1;
        if self.repluck <= 0 {
            self.pluck();
            self.repluck = self.repluck_period;
        }

        let next = (self.idx + 1) % self.len;
        let y = self.buf[self.idx];
        self.buf[self.idx] = 0.5 * (self.buf[self.idx] + self.buf[next]) * Self::DAMPING;
        self.idx = next;
        to_centered(y, 127.0)
    }
}

const MODES: usize = 4;

/// Four inharmonic partials under one shared decaying envelope.
pub struct ModalDrum {
    phases: [Phase; MODES],
    steps: [f32; MODES],
    env: f32,
    retrig: i32,
    retrig_period: i32,
    rng: NoiseSource,
}

impl ModalDrum {
    const FREQS: [f32; MODES] = [180.0, 300.0, 460.0, 620.0];
    const GAINS: [f32; MODES] = [1.0, 0.6, 0.45, 0.35];
    const DECAY: f32 = 0.9992;
    const SILENT: f32 = 0.0008;

    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        Self {
            phases: [Phase::default(); MODES],
            steps: Self::FREQS.map(|f| hz_to_step(f, sample_rate)),
            env: 0.0,
            retrig: 0,
            retrig_period: (0.6 * sample_rate) as i32,
            rng,
        }
    }

    pub fn envelope(&self) -> f32 {
        self.env
    }
}

impl Generator for ModalDrum {
    fn next_sample(&mut self) -> i32 {
        if self.env < Self::SILENT && self.retrig <= 0 {
            self.env = 1.0;
            for phase in &mut self.phases {
                *phase = Phase::new(self.rng.range(0, 1000) as f32 * 0.001 * TAU);
            }
            self.retrig = self.retrig_period;
        }
        if self.retrig > 0 {
            self.retrig -= 1;
        }

        let mut sum = 0.0;
        for i in 0..MODES {
            sum += Self::GAINS[i] * self.phases[i].advance(self.steps[i]).sin();
        }
        sum *= self.env;
        self.env *= Self::DECAY;
        to_centered(sum, 100.0).max(-127)
    }
}

/// Larsen-style howl: a high-Q two-pole resonator fed by very quiet noise,
/// centre swept between 1.7 and 3.3 kHz, soft-clipped with tanh.
pub struct FeedbackHowl {
    resonator: Resonator,
    lfo: Phase,
    lfo_step: f32,
    rng: NoiseSource,
    sample_rate: f32,
}

impl FeedbackHowl {
    const POLE_RADIUS: f32 = 0.9955;
    const DRIVE: f32 = 0.0025;

    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        Self {
            resonator: Resonator::new(1.3),
            lfo: Phase::default(),
            lfo_step: hz_to_step(0.12, sample_rate),
            rng,
            sample_rate,
        }
    }
}

impl Generator for FeedbackHowl {
    fn next_sample(&mut self) -> i32 {
        let lfo = self.lfo.advance(self.lfo_step);
        let center = 2500.0 + 800.0 * lfo.sin();
        // Keep the centre below Nyquist at low engine rates.
        let center = center.min(0.45 * self.sample_rate);
        let x = self.rng.bipolar() * Self::DRIVE;
        let y = self
            .resonator
            .process(x, center, Self::POLE_RADIUS, self.sample_rate);
        to_centered((1.2 * y).tanh(), 127.0)
    }
}
