//! Psychoacoustic tones and time-domain effects.
//!
//! Mono-safe approximations only: everything here is a single channel.

use super::Generator;
use super::random::NoiseSource;
use super::utils::{Phase, hz_to_step, sweep, to_centered};

/// 440 Hz carrier hard-gated on and off nine times a second.
pub struct Isochronic {
    carrier: Phase,
    gate: Phase,
    carrier_step: f32,
    gate_step: f32,
}

impl Isochronic {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            carrier: Phase::default(),
            gate: Phase::default(),
            carrier_step: hz_to_step(440.0, sample_rate),
            gate_step: hz_to_step(9.0, sample_rate),
        }
    }
}

impl Generator for Isochronic {
    fn next_sample(&mut self) -> i32 {
        let c = self.carrier.advance(self.carrier_step);
        let g = self.gate.advance(self.gate_step);
        let open = if g.sin() > 0.0 { 1.0 } else { 0.0 };
        to_centered(c.sin() * open * 0.95, 127.0)
    }
}

/// Sum of sines at fixed frequencies and weights, scaled by `level`.
pub struct Additive<const N: usize> {
    phases: [Phase; N],
    steps: [f32; N],
    weights: [f32; N],
    level: f32,
}

impl<const N: usize> Additive<N> {
    fn new(freqs: [f32; N], weights: [f32; N], level: f32, sample_rate: f32) -> Self {
        Self {
            phases: [Phase::default(); N],
            steps: freqs.map(|f| hz_to_step(f, sample_rate)),
            weights,
            level,
        }
    }

    fn mix(&mut self) -> f32 {
        let mut sum = 0.0;
        for i in 0..N {
            sum += self.weights[i] * self.phases[i].advance(self.steps[i]).sin();
        }
        sum
    }
}

impl Additive<2> {
    /// 440 and 446 Hz: a 6 Hz physical beat.
    pub fn acoustic_beat(sample_rate: f32) -> Self {
        Self::new([440.0, 446.0], [0.5, 0.5], 0.9, sample_rate)
    }
}

impl Additive<1> {
    /// 12 Hz at reduced amplitude.
    pub fn infrasound(sample_rate: f32) -> Self {
        Self::new([12.0], [0.35], 1.0, sample_rate)
    }

    /// Piercing tone as close to the top of hearing as the rate allows:
    /// 17.4 kHz, or 5 kHz at the default 11025 Hz.
    pub fn near_nyquist(sample_rate: f32) -> Self {
        let freq = (5000.0 * (sample_rate / 11_025.0)).min(17_400.0);
        Self::new([freq], [0.8], 1.0, sample_rate)
    }
}

impl<const N: usize> Generator for Additive<N> {
    fn next_sample(&mut self) -> i32 {
        let v = self.mix() * self.level;
        to_centered(v, 127.0)
    }
}

pub type AcousticBeat = Additive<2>;
pub type Infrasound = Additive<1>;
pub type NearNyquist = Additive<1>;

/// Harmonics 2-5 of a 180 Hz fundamental with the fundamental itself absent.
///
/// All harmonics are driven from one phase so they stay locked.
pub struct MissingFundamental {
    phase: Phase,
    step: f32,
}

impl MissingFundamental {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            step: hz_to_step(180.0, sample_rate),
        }
    }
}

impl Generator for MissingFundamental {
    fn next_sample(&mut self) -> i32 {
        let p = self.phase.advance(self.step);
        let v: f32 = (2..=5).map(|n| (n as f32 * p).sin() / n as f32).sum();
        to_centered(v * 0.9, 127.0)
    }
}

/// 700 + 880 Hz through tanh, producing audible difference tones.
pub struct CombinationTones {
    tones: Additive<2>,
}

impl CombinationTones {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            tones: Additive::new([700.0, 880.0], [0.8, 0.8], 1.0, sample_rate),
        }
    }
}

impl Generator for CombinationTones {
    fn next_sample(&mut self) -> i32 {
        let s = self.tones.mix();
        to_centered((1.8 * s).tanh() * 0.9, 127.0)
    }
}

/// 55 Hz thump every 0.6 s with an exponential tail.
pub struct SomaticBass {
    phase: Phase,
    step: f32,
    env: f32,
    countdown: i32,
    period: i32,
}

impl SomaticBass {
    const DECAY: f32 = 0.996;
    const FLOOR: f32 = 0.0003;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            step: hz_to_step(55.0, sample_rate),
            env: 0.0,
            countdown: 0,
            period: ((0.6 * sample_rate) as i32).max(1),
        }
    }
}

impl Generator for SomaticBass {
    fn next_sample(&mut self) -> i32 {
        self.countdown -= 1;
        if self.countdown <= 0 {
            self.env = 1.0;
            self.countdown = self.period;
        }
        let p = self.phase.advance(self.step);
        let v = p.sin() * self.env;
        self.env = (self.env * Self::DECAY).max(Self::FLOOR);
        to_centered(v * 0.95, 127.0)
    }
}

/// 3 kHz emphasis with a touch of second harmonic.
pub struct EarResonance {
    phase: Phase,
    step: f32,
}

impl EarResonance {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            step: hz_to_step(3000.0_f32.min(0.45 * sample_rate), sample_rate),
        }
    }
}

impl Generator for EarResonance {
    fn next_sample(&mut self) -> i32 {
        let p = self.phase.advance(self.step);
        let v = 0.85 * p.sin() + 0.2 * (2.0 * p).sin();
        to_centered(v * 0.7, 127.0)
    }
}

const STUTTER_MAX: usize = 256;

/// Loops a short tone or noise grain, rebuilding it every 50-250 ms.
pub struct Stutter {
    buffer: Box<[f32; STUTTER_MAX]>,
    len: usize,
    idx: usize,
    mode_left: i32,
    min_mode: i32,
    max_mode: i32,
    rng: NoiseSource,
    sample_rate: f32,
}

impl Stutter {
    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        let min_mode = ((0.05 * sample_rate) as i32).max(1);
        Self {
            buffer: Box::new([0.0; STUTTER_MAX]),
            len: 64,
            idx: 0,
            mode_left: 0,
            min_mode,
            max_mode: ((0.25 * sample_rate) as i32).max(min_mode + 1),
            rng,
            sample_rate,
        }
    }

    pub fn grain_len(&self) -> usize {
        self.len
    }

    fn rebuild(&mut self) {
        self.len = (self.rng.range(18, 120) as usize).min(STUTTER_MAX);
        let len = self.len;
        if self.rng.range(0, 100) < 60 {
            let step = hz_to_step(self.rng.range(220, 1800) as f32, self.sample_rate);
            let decay = 0.01f32.powf(1.0 / len as f32);
            let mut phase = Phase::default();
            let mut env = 1.0;
            for v in &mut self.buffer[..len] {
                *v = phase.value().sin() * env * 0.9;
                phase.advance(step);
                env *= decay;
            }
        } else {
            for v in &mut self.buffer[..len] {
                *v = self.rng.bipolar() * 0.8;
            }
        }
        self.idx = 0;
        self.mode_left = self.rng.range(self.min_mode, self.max_mode);
    }
}

impl Generator for Stutter {
    fn next_sample(&mut self) -> i32 {
        if self.mode_left <= 0 {
            self.rebuild();
        }
        let v = self.buffer[self.idx];
        self.idx = (self.idx + 1) % self.len;
        self.mode_left -= 1;
        to_centered(v.clamp(-1.0, 1.0), 127.0)
    }
}

const PHASER_LEN: usize = 512;
const PHASER_MASK: usize = PHASER_LEN - 1;

/// 330 Hz tone through a feedback delay swept over 2-21 samples.
pub struct Phaser {
    line: Box<[f32; PHASER_LEN]>,
    write: usize,
    tone: Phase,
    lfo: Phase,
    tone_step: f32,
    lfo_step: f32,
}

impl Phaser {
    const FEEDBACK: f32 = 0.6;
    /// Bound on the delay line; the loop gain alone settles at 2.5.
    const STATE_LIMIT: f32 = 2.5;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            line: Box::new([0.0; PHASER_LEN]),
            write: 0,
            tone: Phase::default(),
            lfo: Phase::default(),
            tone_step: hz_to_step(330.0, sample_rate),
            lfo_step: hz_to_step(0.2, sample_rate),
        }
    }
}

impl Generator for Phaser {
    fn next_sample(&mut self) -> i32 {
        let input = self.tone.advance(self.tone_step).sin();
        let delay = sweep(2.0, 21.0, self.lfo.advance(self.lfo_step)) as usize;
        let read = (self.write + PHASER_LEN - delay) & PHASER_MASK;
        let delayed = self.line[read];

        self.line[self.write] =
            (input + Self::FEEDBACK * delayed).clamp(-Self::STATE_LIMIT, Self::STATE_LIMIT);
        self.write = (self.write + 1) & PHASER_MASK;

        let out = 0.6 * input + 0.6 * delayed;
        to_centered(out.clamp(-1.0, 1.0), 127.0)
    }
}

/// A 660 Hz source passing the listener every 2.5 s: pitch shifted by the
/// relativistic Doppler ratio, loudest at closest approach.
pub struct Doppler {
    phase: Phase,
    t: f32,
    dt: f32,
    sample_rate: f32,
}

impl Doppler {
    const PASS_SECONDS: f32 = 2.5;
    const MAX_BETA: f32 = 0.25;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            t: 0.0,
            dt: 1.0 / sample_rate,
            sample_rate,
        }
    }
}

impl Generator for Doppler {
    fn next_sample(&mut self) -> i32 {
        self.t += self.dt;
        if self.t > Self::PASS_SECONDS {
            self.t = 0.0;
        }
        let half = Self::PASS_SECONDS * 0.5;
        let x = if self.t < half {
            self.t / half
        } else {
            2.0 - self.t / half
        };
        let beta = 0.5 * (2.0 * x - 1.0) * Self::MAX_BETA;
        let freq = 660.0 * ((1.0 + beta) / (1.0 - beta)).sqrt();
        let p = self.phase.advance_hz(freq, self.sample_rate);
        let amp = 0.4 + 0.6 * (1.0 - (2.0 * x - 1.0).abs());
        to_centered(p.sin() * amp * 0.95, 127.0)
    }
}

const COMB_LEN: usize = 900;

/// Noise burst into a feedback comb, with the tail hard-gated shut.
pub struct GatedReverb {
    comb: Box<[f32; COMB_LEN]>,
    write: usize,
    env: f32,
    retrig: i32,
    retrig_period: i32,
    tail: i32,
    tail_limit: i32,
    rng: NoiseSource,
}

impl GatedReverb {
    const BURST_DECAY: f32 = 0.985;
    const GATE_THRESHOLD: f32 = 0.03;
    const COMB_FEEDBACK: f32 = 0.8;
    const COMB_DAMPING: f32 = 0.88;
    /// Bound on the stored comb taps.
    const STATE_LIMIT: f32 = 3.0;

    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        Self {
            comb: Box::new([0.0; COMB_LEN]),
            write: 0,
            env: 0.0,
            retrig: 0,
            retrig_period: ((0.9 * sample_rate) as i32).max(1),
            tail: 0,
            tail_limit: (0.18 * sample_rate) as i32,
            rng,
        }
    }
}

impl Generator for GatedReverb {
    fn next_sample(&mut self) -> i32 {
        self.retrig -= 1;
        if self.retrig <= 0 {
            self.env = 1.0;
            self.retrig = self.retrig_period;
        }
        let x = self.rng.bipolar() * self.env;
        self.env *= Self::BURST_DECAY;

        let read = (self.write + 1) % COMB_LEN;
        let mut y = x + Self::COMB_FEEDBACK * self.comb[read];
        if self.env < Self::GATE_THRESHOLD {
            let open_for = self.tail;
            self.tail += 1;
            if open_for > self.tail_limit {
                y = 0.0;
            }
        } else {
            self.tail = 0;
        }

        self.comb[self.write] =
            (y * Self::COMB_DAMPING).clamp(-Self::STATE_LIMIT, Self::STATE_LIMIT);
        self.write = read;
        to_centered(y.clamp(-1.0, 1.0), 127.0)
    }
}

/// 1.8 kHz tone resampled with a hold length swept between 2 and 14 samples.
pub struct AliasingBuzz {
    phase: Phase,
    lfo: Phase,
    step: f32,
    lfo_step: f32,
    held: f32,
    hold: i32,
}

impl AliasingBuzz {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: Phase::default(),
            lfo: Phase::default(),
            step: hz_to_step(1800.0, sample_rate),
            lfo_step: hz_to_step(0.15, sample_rate),
            held: 0.0,
            hold: 0,
        }
    }
}

impl Generator for AliasingBuzz {
    fn next_sample(&mut self) -> i32 {
        let l = self.lfo.advance(self.lfo_step);
        let hold_len = 2 + sweep(0.0, 12.0, l).round() as i32;
        if self.hold <= 0 {
            self.held = self.phase.advance(self.step).sin() * 0.95;
            self.hold = hold_len;
        }
        self.hold -= 1;
        to_centered(self.held, 127.0)
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
    fn test_isochronic_gate_is_silent_half_the_time() {
        let samples = collect(&mut Isochronic::new(SR), SR as usize);
        let silent = samples.iter().filter(|&&s| s == 0).count();
        let ratio = silent as f32 / samples.len() as f32;
        assert!((0.45..0.6).contains(&ratio), "gate closed ratio {ratio}");
    }

    #[test]
    fn test_near_nyquist_frequency_follows_rate() {
        let nn = NearNyquist::near_nyquist(SR);
        assert_eq!(nn.steps[0], hz_to_step(5000.0, SR));
        let nn = NearNyquist::near_nyquist(48_000.0);
        assert!((nn.steps[0] - hz_to_step(17_400.0, 48_000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_missing_fundamental_has_no_energy_at_f0() {
        let samples = collect(&mut MissingFundamental::new(SR), 11_025);
        // Correlate against the fundamental over a whole number of periods.
        let step = hz_to_step(180.0, SR);
        let n = 11_025usize;
        let (mut re, mut im, mut total) = (0.0f64, 0.0f64, 0.0f64);
        for (i, &s) in samples[..n].iter().enumerate() {
            let a = (i as f32 + 1.0) * step;
            re += s as f64 * a.cos() as f64;
            im += s as f64 * a.sin() as f64;
            total += (s as f64).powi(2);
        }
        let f0_power = (re * re + im * im) / (n as f64 / 2.0);
        assert!(f0_power < total * 0.01, "fundamental power {f0_power} vs total {total}");
    }

    #[test]
    fn test_somatic_bass_floor_keeps_tail_alive() {
        let mut bass = SomaticBass::new(SR);
        collect(&mut bass, 6_000);
        assert!(bass.env >= SomaticBass::FLOOR);
    }

    #[test]
    fn test_stutter_loops_grain() {
        let mut stutter = Stutter::new(SR, NoiseSource::new(8));
        let first = stutter.next_sample();
        let len = stutter.grain_len();
        assert!((18..120).contains(&len));
        let mut looped = vec![first];
        looped.extend(collect(&mut stutter, len));
        assert_eq!(looped[0], looped[len], "grain should repeat after {len} samples");
    }

    #[test]
    fn test_effects_bounded() {
        let mut phaser = Phaser::new(SR);
        let mut doppler = Doppler::new(SR);
        let mut reverb = GatedReverb::new(SR, NoiseSource::new(2));
        let mut buzz = AliasingBuzz::new(SR);
        let mut stutter = Stutter::new(SR, NoiseSource::new(3));
        for _ in 0..200_000 {
            for s in [
                phaser.next_sample(),
                doppler.next_sample(),
                reverb.next_sample(),
                buzz.next_sample(),
                stutter.next_sample(),
            ] {
                assert!((-128..=127).contains(&s));
            }
        }
    }

    #[test]
    fn test_phaser_delay_line_stays_bounded() {
        let mut phaser = Phaser::new(SR);
        for _ in 0..1_000_000 {
            phaser.next_sample();
        }
        assert!(
            phaser.line.iter().all(|v| v.abs() <= Phaser::STATE_LIMIT),
            "delay line escaped its bound"
        );

        // Saturate the line; the clamp must hold even from a runaway state.
        phaser.line.fill(1.0e6);
        for _ in 0..PHASER_LEN {
            assert!((-128..=127).contains(&phaser.next_sample()));
        }
        let peak = phaser.line.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        assert!(peak <= Phaser::STATE_LIMIT, "peak {peak}");
    }

    #[test]
    fn test_gated_reverb_comb_stays_bounded() {
        let mut reverb = GatedReverb::new(SR, NoiseSource::new(11));
        for _ in 0..1_000_000 {
            reverb.next_sample();
        }
        assert!(
            reverb.comb.iter().all(|v| v.abs() <= GatedReverb::STATE_LIMIT),
            "comb escaped its bound"
        );

        reverb.comb.fill(-1.0e6);
        for _ in 0..COMB_LEN {
            reverb.next_sample();
        }
        let peak = reverb.comb.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        assert!(peak <= GatedReverb::STATE_LIMIT, "peak {peak}");
    }

    #[test]
    fn test_gated_reverb_tail_is_cut() {
        let mut reverb = GatedReverb::new(SR, NoiseSource::new(7));
        let n = reverb.retrig_period as usize - 1;
        let samples = collect(&mut reverb, n);
        // The burst falls under the gate threshold after ~230 samples; the
        // tail then rings for 0.18 s before being shut.
        let gate_shut = 230 + reverb.tail_limit as usize + 50;
        assert!(samples[..gate_shut / 2].iter().any(|&s| s != 0));
        assert!(
            samples[gate_shut..].iter().all(|&s| s == 0),
            "gated tail should be silent"
        );
    }

    #[test]
    fn test_aliasing_buzz_hold_lengths() {
        let samples = collect(&mut AliasingBuzz::new(SR), SR as usize * 7);
        let mut run = 1;
        let mut longest = 0;
        for w in samples.windows(2) {
            if w[0] == w[1] {
                run += 1;
            } else {
                longest = longest.max(run);
                run = 1;
            }
        }
        assert!(longest >= 12, "hold length never reached the top of its sweep: {longest}");
    }
}
