//! Phase-accumulator oscillators: the basic waveforms, chirp, two-operator
//! FM, AM tremolo and PWM.

use super::Generator;
use super::random::NoiseSource;
use super::utils::{Phase, Ramp, hz_to_step, to_centered};
use std::f32::consts::TAU;

/// Output headroom shared by the basic tone family.
const TONE_LEVEL: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Saw,
}

impl Waveform {
    fn reference_hz(self) -> f32 {
        match self {
            Waveform::Saw => 220.0,
            _ => 440.0,
        }
    }

    #[inline]
    fn shape(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                if phase.sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                let saw = 2.0 * (phase / TAU) - 1.0;
                2.0 * saw.abs() - 1.0
            }
            Waveform::Saw => 2.0 * (phase / TAU) - 1.0,
        }
    }
}

/// Fixed-pitch oscillator with a one-step random jitter on every increment.
pub struct BasicTone {
    waveform: Waveform,
    phase: Phase,
    step: f32,
    rng: NoiseSource,
}

impl BasicTone {
    const JITTER: f32 = 0.00005;

    pub fn new(waveform: Waveform, sample_rate: f32, rng: NoiseSource) -> Self {
        Self {
            waveform,
            phase: Phase::default(),
            step: hz_to_step(waveform.reference_hz(), sample_rate),
            rng,
        }
    }
}

impl Generator for BasicTone {
    fn next_sample(&mut self) -> i32 {
        let jitter = self.rng.range(-1, 2) as f32 * Self::JITTER;
        let p = self.phase.advance(self.step + jitter);
        to_centered(self.waveform.shape(p) * TONE_LEVEL, 127.0)
    }
}

/// Sine whose frequency sweeps linearly between two bounds and back.
pub struct Chirp {
    phase: Phase,
    freq: f32,
    rising: bool,
    delta: f32,
    sample_rate: f32,
}

impl Chirp {
    pub const LOW_HZ: f32 = 200.0;
    pub const HIGH_HZ: f32 = 1200.0;
    const SWEEP_SECONDS: f32 = 4.0;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            freq: Self::LOW_HZ,
            rising: true,
            delta: (Self::HIGH_HZ - Self::LOW_HZ) / (sample_rate * Self::SWEEP_SECONDS),
            sample_rate,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.freq
    }
}

impl Generator for Chirp {
    fn next_sample(&mut self) -> i32 {
        let freq = self.freq;
        if self.rising {
            self.freq += self.delta;
        } else {
            self.freq -= self.delta;
        }
        if self.freq > Self::HIGH_HZ {
            self.freq = Self::HIGH_HZ;
            self.rising = false;
        }
        if self.freq < Self::LOW_HZ {
            self.freq = Self::LOW_HZ;
            self.rising = true;
        }

        let p = self.phase.advance_hz(freq, self.sample_rate);
        to_centered(p.sin() * TONE_LEVEL, 127.0)
    }
}

/// Two-operator FM: the modulator sine offsets the carrier's instantaneous
/// frequency by `index * modulator_hz`.
pub struct Fm {
    carrier: Phase,
    modulator: Phase,
    carrier_hz: f32,
    modulator_hz: f32,
    index: f32,
    level: f32,
    sample_rate: f32,
}

impl Fm {
    pub fn new(carrier_hz: f32, modulator_hz: f32, index: f32, level: f32, sample_rate: f32) -> Self {
        Self {
            carrier: Phase::default(),
            modulator: Phase::default(),
            carrier_hz,
            modulator_hz,
            index,
            level,
            sample_rate,
        }
    }

    /// 440 Hz carrier, 110 Hz modulator, index 2.
    pub fn bell(sample_rate: f32) -> Self {
        Self::new(440.0, 110.0, 2.0, TONE_LEVEL, sample_rate)
    }

    /// Inharmonic 330:780 ratio with a high index.
    pub fn metallic(sample_rate: f32) -> Self {
        Self::new(330.0, 780.0, 3.2, 0.95, sample_rate)
    }
}

impl Generator for Fm {
    fn next_sample(&mut self) -> i32 {
        let m = self.modulator.advance_hz(self.modulator_hz, self.sample_rate);
        let inst = self.carrier_hz + self.index * self.modulator_hz * m.sin();
        let c = self.carrier.advance_hz(inst, self.sample_rate);
        to_centered(c.sin() * self.level, 127.0)
    }
}

/// 440 Hz sine under a 5 Hz unipolar envelope that never falls below
/// `1 - DEPTH`.
pub struct Tremolo {
    carrier: Phase,
    lfo: Phase,
    carrier_step: f32,
    lfo_step: f32,
}

impl Tremolo {
    const DEPTH: f32 = 0.8;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            carrier: Phase::default(),
            lfo: Phase::default(),
            carrier_step: hz_to_step(440.0, sample_rate),
            lfo_step: hz_to_step(5.0, sample_rate),
        }
    }
}

impl Generator for Tremolo {
    fn next_sample(&mut self) -> i32 {
        let c = self.carrier.advance(self.carrier_step);
        let m = self.lfo.advance(self.lfo_step);
        let envelope = 0.5 * (1.0 + m.sin());
        let amp = (1.0 - Self::DEPTH) + Self::DEPTH * envelope;
        to_centered(c.sin() * amp * TONE_LEVEL, 127.0)
    }
}

/// 110 Hz pulse whose duty cycle is swept between 0.1 and 0.9 at 2 Hz.
pub struct Pwm {
    ramp: Ramp,
    lfo: Ramp,
    sample_rate: f32,
}

impl Pwm {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            ramp: Ramp::default(),
            lfo: Ramp::default(),
            sample_rate,
        }
    }
}

impl Generator for Pwm {
    fn next_sample(&mut self) -> i32 {
        self.ramp.advance(110.0, self.sample_rate);
        self.lfo.advance(2.0, self.sample_rate);
        let duty = 0.5 + 0.4 * (TAU * self.lfo.value()).sin();
        to_centered(self.ramp.pulse(duty), 110.0)
    }
}
