//! Stochastic granular cloud over a fixed pool of sine grains.

use super::Generator;
use super::random::NoiseSource;
use super::utils::{Phase, hz_to_step, to_centered};

pub const GRAIN_SLOTS: usize = 8;

#[derive(Debug, Default, Clone, Copy)]
struct Grain {
    active: bool,
    phase: Phase,
    step: f32,
    amp: f32,
    decay: f32,
    left: i32,
}

pub struct Granular {
    grains: [Grain; GRAIN_SLOTS],
    min_len: i32,
    max_len: i32,
    rng: NoiseSource,
    sample_rate: f32,
}

impl Granular {
    /// Spawn probability per sample, in thousandths.
    const SPAWN_PER_MILLE: i32 = 6;
    /// Amplitude a grain has decayed to when its lifetime ends.
    const END_LEVEL: f32 = 0.001;

    pub fn new(sample_rate: f32, rng: NoiseSource) -> Self {
        let min_len = ((0.05 * sample_rate) as i32).max(1);
        Self {
            grains: [Grain::default(); GRAIN_SLOTS],
            min_len,
            max_len: ((0.20 * sample_rate) as i32).max(min_len + 1),
            rng,
            sample_rate,
        }
    }

    pub fn active_grains(&self) -> usize {
        self.grains.iter().filter(|g| g.active).count()
    }

    fn spawn(&mut self) {
        let Some(slot) = self.grains.iter().position(|g| !g.active) else {
            return;
        };
        let freq = self.rng.range(200, 2000) as f32;
        let dur = self.rng.range(self.min_len, self.max_len);
        let amp = 0.15 + self.rng.range(0, 100) as f32 * 0.003;
        self.grains[slot] = Grain {
            active: true,
            phase: Phase::default(),
            step: hz_to_step(freq, self.sample_rate),
            amp,
            decay: Self::END_LEVEL.powf(1.0 / dur as f32),
            left: dur,
        };
    }
}

impl Generator for Granular {
    fn next_sample(&mut self) -> i32 {
        if self.rng.chance(Self::SPAWN_PER_MILLE) {
            self.spawn();
        }

        let mut sum = 0.0;
        for grain in self.grains.iter_mut().filter(|g| g.active) {
            sum += grain.amp * grain.phase.value().sin();
            grain.phase.advance(grain.step);
            grain.amp *= grain.decay;
            grain.left -= 1;
            if grain.left <= 0 || grain.amp < Self::END_LEVEL {
                grain.active = false;
            }
        }
        to_centered(sum, 127.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 11_025.0;

    #[test]
    fn test_pool_never_exceeds_slots_and_grains_expire() {
        let mut g = Granular::new(SR, NoiseSource::new(12));
        let mut max_active = 0;
        let mut saw_activity = false;
        for _ in 0..(SR * 30.0) as usize {
            let s = g.next_sample();
            assert!((-128..=127).contains(&s));
            max_active = max_active.max(g.active_grains());
            saw_activity |= s != 0;
        }
        assert!(max_active <= GRAIN_SLOTS);
        assert!(max_active >= 2, "cloud never overlapped grains");
        assert!(saw_activity);
    }

    #[test]
    fn test_grain_lifetime_is_bounded_by_its_duration() {
        let mut g = Granular::new(SR, NoiseSource::new(13));
        g.spawn();
        assert_eq!(g.active_grains(), 1);
        let grain = g.grains[0];
        assert!(grain.left >= g.min_len && grain.left < g.max_len);
        let end = grain.decay.powi(grain.left);
        assert!(
            (end - Granular::END_LEVEL).abs() < 1e-4,
            "decay should land on the end level after the grain's duration, got {end}"
        );
    }
}
