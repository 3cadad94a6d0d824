//! Modulation, detune stacks, filtering and distortion.

use super::Generator;
use super::filters::StateVariable;
use super::random::NoiseSource;
use super::utils::{Phase, Ramp, hz_to_step, sweep, to_centered};
use std::f32::consts::TAU;

/// Native scale of the modulation family.
const LEVEL: f32 = 120.0;

/// 220 Hz carrier multiplied by a 60 Hz sine.
pub struct RingMod {
    carrier: Phase,
    modulator: Phase,
    carrier_step: f32,
    modulator_step: f32,
}

impl RingMod {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            carrier: Phase::default(),
            modulator: Phase::default(),
            carrier_step: hz_to_step(220.0, sample_rate),
            modulator_step: hz_to_step(60.0, sample_rate),
        }
    }
}

impl Generator for RingMod {
    fn next_sample(&mut self) -> i32 {
        let c = self.carrier.advance(self.carrier_step);
        let m = self.modulator.advance(self.modulator_step);
        to_centered(c.sin() * m.sin(), LEVEL)
    }
}

/// Three 220 Hz sines, two of them with slow independent vibrato.
pub struct Chorus {
    voices: [Phase; 3],
    lfo_a: Phase,
    lfo_b: Phase,
    lfo_a_step: f32,
    lfo_b_step: f32,
    sample_rate: f32,
}

impl Chorus {
    const BASE_HZ: f32 = 220.0;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: [Phase::default(); 3],
            lfo_a: Phase::default(),
            lfo_b: Phase::new(1.3),
            lfo_a_step: hz_to_step(3.509, sample_rate),
            lfo_b_step: hz_to_step(2.281, sample_rate),
            sample_rate,
        }
    }
}

impl Generator for Chorus {
    fn next_sample(&mut self) -> i32 {
        let a = self.lfo_a.advance(self.lfo_a_step);
        let b = self.lfo_b.advance(self.lfo_b_step);
        let freqs = [
            Self::BASE_HZ * (1.0 + 0.004 * a.sin()),
            Self::BASE_HZ * (1.0 - 0.005 * b.sin()),
            Self::BASE_HZ,
        ];

        let mut sum = 0.0;
        for (voice, f) in self.voices.iter_mut().zip(freqs) {
            sum += voice.advance_hz(f, self.sample_rate).sin();
        }
        to_centered(sum / 3.0, LEVEL)
    }
}

/// Random targets held for 3-73 ms, approached by a one-pole follower.
pub struct SampleHold {
    hold: i32,
    min_hold: i32,
    max_hold: i32,
    target: f32,
    current: f32,
    rng: NoiseSource,
}

impl SampleHold {
    const MIN_HOLD_SECONDS: f32 = 0.00272;
    const MAX_HOLD_SECONDS: f32 = 0.07256;
    const GLIDE: f32 = 0.05;

    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        let min_hold = ((sample_rate * Self::MIN_HOLD_SECONDS).round() as i32).max(1);
        let max_hold = ((sample_rate * Self::MAX_HOLD_SECONDS).round() as i32).max(min_hold + 1);
        Self {
            hold: 0,
            min_hold,
            max_hold,
            target: 0.0,
            current: 0.0,
            rng,
        }
    }
}

impl Generator for SampleHold {
    fn next_sample(&mut self) -> i32 {
        self.hold -= 1;
        if self.hold <= 0 {
            self.target = self.rng.bipolar();
            self.hold = self.rng.range(self.min_hold, self.max_hold);
        }
        self.current += Self::GLIDE * (self.target - self.current);
        self.current = self.current.clamp(-1.0, 1.0);
        to_centered(self.current, 127.0)
    }
}

/// Noise through three parallel band-passes at vowel-like formants.
pub struct Formant {
    bands: [StateVariable; 3],
    rng: NoiseSource,
    sample_rate: f32,
}

impl Formant {
    const CENTERS: [f32; 3] = [700.0, 1200.0, 2400.0];
    const WEIGHTS: [f32; 3] = [0.9, 0.7, 0.5];
    const DAMPING: f32 = 0.2;

    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        Self {
            bands: [StateVariable::default(); 3],
            rng,
            sample_rate,
        }
    }
}

impl Generator for Formant {
    fn next_sample(&mut self) -> i32 {
        let x = self.rng.bipolar();
        let mut v = 0.0;
        for (i, band) in self.bands.iter_mut().enumerate() {
            let center = Self::CENTERS[i].min(0.45 * self.sample_rate);
            v += band.bandpass(x, center, Self::DAMPING, self.sample_rate) * Self::WEIGHTS[i];
        }
        to_centered((v * 0.7).clamp(-1.0, 1.0), 127.0)
    }
}

/// 330 Hz saw hard-synced to a 110 Hz master.
pub struct HardSync {
    master: Ramp,
    slave: Ramp,
    sample_rate: f32,
}

impl HardSync {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            master: Ramp::default(),
            slave: Ramp::default(),
            sample_rate,
        }
    }
}

impl Generator for HardSync {
    fn next_sample(&mut self) -> i32 {
        if self.master.advance(110.0, self.sample_rate) {
            self.slave.reset();
        }
        self.slave.advance(330.0, self.sample_rate);
        to_centered(self.slave.saw(), LEVEL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackShape {
    Saw,
    Square,
}

/// Detuned oscillators around 110 Hz, averaged.
pub struct DetuneStack<const N: usize> {
    shape: StackShape,
    ramps: [Ramp; N],
    freqs: [f32; N],
    sample_rate: f32,
}

pub type SuperSaw = DetuneStack<6>;
pub type SuperSquare = DetuneStack<4>;

const STACK_BASE_HZ: f32 = 110.0;

impl DetuneStack<6> {
    pub fn supersaw(sample_rate: f32) -> Self {
        Self::new(
            StackShape::Saw,
            [0.985, 0.992, 0.998, 1.002, 1.008, 1.015],
            sample_rate,
        )
    }
}

impl DetuneStack<4> {
    pub fn supersquare(sample_rate: f32) -> Self {
        Self::new(StackShape::Square, [0.985, 0.997, 1.003, 1.015], sample_rate)
    }
}

impl<const N: usize> DetuneStack<N> {
    fn new(shape: StackShape, detune: [f32; N], sample_rate: f32) -> Self {
        Self {
            shape,
            ramps: [Ramp::default(); N],
            freqs: detune.map(|d| STACK_BASE_HZ * d),
            sample_rate,
        }
    }
}

impl<const N: usize> Generator for DetuneStack<N> {
    fn next_sample(&mut self) -> i32 {
        let mut sum = 0.0;
        for (ramp, &f) in self.ramps.iter_mut().zip(self.freqs.iter()) {
            ramp.advance(f, self.sample_rate);
            sum += match self.shape {
                StackShape::Saw => ramp.saw(),
                StackShape::Square => ramp.pulse(0.5),
            };
        }
        let v = sum / N as f32;
        match self.shape {
            StackShape::Saw => to_centered(v, LEVEL),
            StackShape::Square => to_centered(v, 110.0),
        }
    }
}

/// 220 Hz sine quantized to eight levels and held for eight samples.
pub struct Bitcrush {
    phase: Phase,
    step: f32,
    held: f32,
    hold: u32,
}

impl Bitcrush {
    const HOLD: u32 = 8;
    const LEVELS: f32 = 8.0;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            step: hz_to_step(220.0, sample_rate),
            held: 0.0,
            hold: 0,
        }
    }
}

impl Generator for Bitcrush {
    fn next_sample(&mut self) -> i32 {
        if self.hold == 0 {
            let p = self.phase.advance(self.step);
            let x = 0.5 * p.sin() + 0.5;
            let q = (x * (Self::LEVELS - 1.0)).round();
            self.held = 2.0 * q / (Self::LEVELS - 1.0) - 1.0;
            self.hold = Self::HOLD;
        }
        self.hold -= 1;
        to_centered(self.held, LEVEL)
    }
}

/// `sin(p + depth * sin(p))` at 220 Hz with depth swept at 1.2 Hz.
pub struct PhaseDistortion {
    phase: Phase,
    lfo: Phase,
    step: f32,
    lfo_step: f32,
}

impl PhaseDistortion {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            lfo: Phase::default(),
            step: hz_to_step(220.0, sample_rate),
            lfo_step: hz_to_step(1.2, sample_rate),
        }
    }
}

impl Generator for PhaseDistortion {
    fn next_sample(&mut self) -> i32 {
        let p = self.phase.advance(self.step);
        let l = self.lfo.advance(self.lfo_step);
        let depth = sweep(0.0, 1.2, l);
        to_centered((p + depth * p.sin()).sin(), LEVEL)
    }
}

/// tanh saturation of a 220 Hz sine, drive swept 1.5-3.5 at 0.8 Hz.
pub struct Wavefold {
    phase: Phase,
    lfo: Phase,
    step: f32,
    lfo_step: f32,
}

impl Wavefold {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            lfo: Phase::default(),
            step: hz_to_step(220.0, sample_rate),
            lfo_step: hz_to_step(0.8, sample_rate),
        }
    }
}

impl Generator for Wavefold {
    fn next_sample(&mut self) -> i32 {
        let p = self.phase.advance(self.step);
        let l = self.lfo.advance(self.lfo_step);
        let drive = sweep(1.5, 3.5, l);
        to_centered((drive * p.sin()).tanh(), LEVEL)
    }
}

/// White noise through a band-pass whose centre sweeps 200 Hz-2 kHz at
/// 0.3 Hz.
pub struct BandpassNoise {
    filter: StateVariable,
    lfo: Ramp,
    rng: NoiseSource,
    sample_rate: f32,
}

impl BandpassNoise {
    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        Self {
            filter: StateVariable::default(),
            lfo: Ramp::default(),
            rng,
            sample_rate,
        }
    }
}

impl Generator for BandpassNoise {
    fn next_sample(&mut self) -> i32 {
        let x = self.rng.bipolar();
        self.lfo.advance(0.3, self.sample_rate);
        let center = sweep(200.0, 2000.0, TAU * self.lfo.value()).min(0.45 * self.sample_rate);
        let band = self.filter.bandpass(x, center, 0.3, self.sample_rate);
        to_centered(band.clamp(-1.0, 1.0), 127.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 11_025.0;

    fn collect(g: &mut impl Generator, n: usize) -> Vec<i32> {
        (0..n).map(|_| g.next_sample()).collect()
    }

    #[test]
    fn test_native_scales() {
        let peak = |v: Vec<i32>| v.iter().map(|s| s.abs()).max().unwrap_or(0);
        assert!(peak(collect(&mut RingMod::new(SR), 20_000)) <= 120);
        assert!(peak(collect(&mut Chorus::new(SR), 20_000)) <= 120);
        assert!(peak(collect(&mut SuperSaw::supersaw(SR), 20_000)) <= 120);
        assert_eq!(peak(collect(&mut SuperSquare::supersquare(SR), 20_000)), 110);
        assert_eq!(peak(collect(&mut Bitcrush::new(SR), 20_000)), 120);
    }

    #[test]
    fn test_bitcrush_holds_eight_samples_on_eight_levels() {
        let samples = collect(&mut Bitcrush::new(SR), 8 * 200);
        for chunk in samples.chunks(8) {
            assert!(chunk.iter().all(|&s| s == chunk[0]), "hold broken: {chunk:?}");
        }
        let mut levels: Vec<i32> = samples.clone();
        levels.sort_unstable();
        levels.dedup();
        assert!(levels.len() <= 8, "more than eight levels: {levels:?}");
    }

    #[test]
    fn test_hard_sync_resets_slave_on_master_cycle() {
        let mut sync = HardSync::new(SR);
        let master_period = (SR / 110.0) as usize;
        let samples = collect(&mut sync, master_period * 10);
        // Each master cycle restarts the slave ramp at the bottom of the saw.
        let resets = samples
            .windows(2)
            .filter(|w| w[1] < w[0] - 100)
            .count();
        // Three slave cycles per master cycle, each ending in a drop.
        assert!((28..=31).contains(&resets), "unexpected reset count {resets}");
    }

    #[test]
    fn test_sample_hold_stays_in_range_and_moves() {
        let samples = collect(&mut SampleHold::new(SR, NoiseSource::new(3)), 50_000);
        assert!(samples.iter().all(|s| (-128..=127).contains(s)));
        let distinct = {
            let mut v = samples.clone();
            v.sort_unstable();
            v.dedup();
            v.len()
        };
        assert!(distinct > 100, "random walk should visit many values, saw {distinct}");
    }

    #[test]
    fn test_sample_hold_durations_scale_with_rate() {
        let a = SampleHold::new(11_025.0, NoiseSource::new(1));
        assert_eq!((a.min_hold, a.max_hold), (30, 800));
        let b = SampleHold::new(22_050.0, NoiseSource::new(1));
        assert_eq!((b.min_hold, b.max_hold), (60, 1600));
    }

    #[test]
    fn test_filters_stay_bounded() {
        let mut formant = Formant::new(SR, NoiseSource::new(5));
        let mut bp = BandpassNoise::new(SR, NoiseSource::new(6));
        for _ in 0..200_000 {
            assert!(formant.next_sample().abs() <= 127);
            assert!(bp.next_sample().abs() <= 127);
        }
    }

    #[test]
    fn test_wavefold_and_phase_distortion_bounded() {
        let mut fold = Wavefold::new(SR);
        let mut pd = PhaseDistortion::new(SR);
        for _ in 0..100_000 {
            assert!(fold.next_sample().abs() <= 120);
            assert!(pd.next_sample().abs() <= 120);
        }
    }
}
