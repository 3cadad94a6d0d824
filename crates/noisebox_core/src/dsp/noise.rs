//! Noise colourings built from a uniform 8-bit source.

use super::Generator;
use super::random::NoiseSource;
use super::utils::to_centered;

pub struct WhiteNoise {
    rng: NoiseSource,
}

impl WhiteNoise {
    pub fn new(rng: NoiseSource) -> Self {
        Self { rng }
    }
}

impl Generator for WhiteNoise {
    #[inline]
    fn next_sample(&mut self) -> i32 {
        self.rng.range(-128, 128)
    }
}

const PINK_ROWS: usize = 16;

/// Voss-McCartney pink noise: row `i` is redrawn every `2^i` samples.
pub struct PinkNoise {
    rng: NoiseSource,
    rows: [i32; PINK_ROWS],
    counter: u32,
}

impl PinkNoise {
    pub fn new(mut rng: NoiseSource) -> Self {
        let mut rows = [0; PINK_ROWS];
        for row in rows.iter_mut() {
            *row = rng.range(-32768, 32767);
        }
        Self {
            rng,
            rows,
            counter: 0,
        }
    }
}

impl Generator for PinkNoise {
    fn next_sample(&mut self) -> i32 {
        self.counter = self.counter.wrapping_add(1);
        let deepest = (self.counter.trailing_zeros() as usize).min(PINK_ROWS - 1);
        for row in &mut self.rows[..=deepest] {
            *row = self.rng.range(-32768, 32767);
        }

        let sum: i64 = self.rows.iter().map(|&r| r as i64).sum();
        let s = sum as f32 / (PINK_ROWS as f32 * 32768.0);
        to_centered(s, 127.0)
    }
}

/// Leaky random walk, hard-limited to [-1, 1].
pub struct BrownNoise {
    rng: NoiseSource,
    acc: f32,
}

impl BrownNoise {
    const LEAK: f32 = 0.995;

    pub fn new(rng: NoiseSource) -> Self {
        Self { rng, acc: 0.0 }
    }
}

impl Generator for BrownNoise {
    fn next_sample(&mut self) -> i32 {
        let step = self.rng.range(-64, 65) as f32 / 256.0;
        self.acc = ((self.acc + step) * Self::LEAK).clamp(-1.0, 1.0);
        to_centered(self.acc, 127.0)
    }
}

/// First difference of white noise, averaged with the fresh draw.
pub struct BlueNoise {
    rng: NoiseSource,
    prev: i32,
}

impl BlueNoise {
    pub fn new(rng: NoiseSource) -> Self {
        Self { rng, prev: 0 }
    }
}

impl Generator for BlueNoise {
    fn next_sample(&mut self) -> i32 {
        let w = self.rng.range(-128, 128);
        let diff = w - self.prev;
        self.prev = w;
        ((w + diff) / 2).clamp(-128, 127)
    }
}

/// Second difference of white noise, divided by 3.
pub struct VioletNoise {
    rng: NoiseSource,
    w1: i32,
    w2: i32,
}

impl VioletNoise {
    pub fn new(rng: NoiseSource) -> Self {
        Self { rng, w1: 0, w2: 0 }
    }
}

impl Generator for VioletNoise {
    fn next_sample(&mut self) -> i32 {
        let w0 = self.rng.range(-128, 128);
        let s = w0 - 2 * self.w1 + self.w2;
        self.w2 = self.w1;
        self.w1 = w0;
        (s / 3).clamp(-128, 127)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(generator: &mut impl Generator, n: usize) -> Vec<i32> {
        (0..n).map(|_| generator.next_sample()).collect()
    }

    /// Mean of the squared first difference relative to the variance. White
    /// noise sits near 2, lowpass colours well below it.
    fn roughness(samples: &[i32]) -> f64 {
        let n = samples.len() as f64;
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
        let var = samples.iter().map(|&s| (s as f64 - mean).powi(2)).sum::<f64>() / n;
        let diff = samples
            .windows(2)
            .map(|w| ((w[1] - w[0]) as f64).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        diff / var.max(1e-9)
    }

    #[test]
    fn test_white_covers_full_range() {
        let samples = run(&mut WhiteNoise::new(NoiseSource::new(1)), 50_000);
        assert_eq!(*samples.iter().min().unwrap(), -128);
        assert_eq!(*samples.iter().max().unwrap(), 127);
    }

    #[test]
    fn test_colours_are_bounded() {
        let mut pink = PinkNoise::new(NoiseSource::new(2));
        let mut brown = BrownNoise::new(NoiseSource::new(3));
        let mut blue = BlueNoise::new(NoiseSource::new(4));
        let mut violet = VioletNoise::new(NoiseSource::new(5));
        for _ in 0..200_000 {
            for s in [
                pink.next_sample(),
                brown.next_sample(),
                blue.next_sample(),
                violet.next_sample(),
            ] {
                assert!((-128..=127).contains(&s), "sample out of range: {s}");
            }
        }
    }

    #[test]
    fn test_brown_is_smoother_than_pink_smoother_than_white() {
        let white = roughness(&run(&mut WhiteNoise::new(NoiseSource::new(9)), 65_536));
        let pink = roughness(&run(&mut PinkNoise::new(NoiseSource::new(9)), 65_536));
        let brown = roughness(&run(&mut BrownNoise::new(NoiseSource::new(9)), 65_536));
        assert!(pink < white, "pink {pink} should be smoother than white {white}");
        assert!(brown < pink, "brown {brown} should be smoother than pink {pink}");
    }

    #[test]
    fn test_blue_and_violet_are_rougher_than_white() {
        let white = roughness(&run(&mut WhiteNoise::new(NoiseSource::new(11)), 65_536));
        let blue = roughness(&run(&mut BlueNoise::new(NoiseSource::new(11)), 65_536));
        let violet = roughness(&run(&mut VioletNoise::new(NoiseSource::new(11)), 65_536));
        assert!(blue > white, "blue {blue} vs white {white}");
        assert!(violet > blue, "violet {violet} vs blue {blue}");
    }

    #[test]
    fn test_pink_counter_wrap_refreshes_all_rows() {
        let mut pink = PinkNoise::new(NoiseSource::new(3));
        pink.counter = u32::MAX;
        let before = pink.rows;
        pink.next_sample();
        let changed = pink.rows.iter().zip(before.iter()).filter(|(a, b)| a != b).count();
        assert!(changed >= PINK_ROWS - 1, "only {changed} rows changed at counter wrap");
    }
}
