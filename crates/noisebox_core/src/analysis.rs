//! Offline measurements over rendered 8-bit runs.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use crate::consts::MIDPOINT;

pub const FRAME_LEN: usize = 1024;

/// Fraction of spectral energy above `split_hz`.
///
/// The run is cut into [`FRAME_LEN`]-sample frames (a short tail is
/// zero-padded into one frame); each frame has its mean removed and a Hann
/// window applied. Energy is summed over every frame before dividing. Returns
/// 0 for silent or empty input.
pub fn band_energy_ratio(samples: &[u8], split_hz: f32, sample_rate: u32) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FRAME_LEN);
    let window: Vec<f32> = (0..FRAME_LEN)
        .map(|i| {
            let x = std::f32::consts::TAU * i as f32 / (FRAME_LEN - 1) as f32;
            0.5 - 0.5 * x.cos()
        })
        .collect();
    let bin_hz = sample_rate as f32 / FRAME_LEN as f32;

    let mut buf = vec![Complex::new(0.0f32, 0.0); FRAME_LEN];
    let mut high = 0.0f64;
    let mut total = 0.0f64;
    for frame in samples.chunks(FRAME_LEN) {
        let mean = frame.iter().map(|&s| s as f32).sum::<f32>() / frame.len() as f32;
        for (i, slot) in buf.iter_mut().enumerate() {
            let v = frame.get(i).map_or(0.0, |&s| s as f32 - mean);
            *slot = Complex::new(v * window[i], 0.0);
        }
        fft.process(&mut buf);
        // Bins 1..=N/2; DC is already removed.
        for (k, c) in buf.iter().enumerate().take(FRAME_LEN / 2 + 1).skip(1) {
            let e = c.norm_sqr() as f64;
            total += e;
            if k as f32 * bin_hz > split_hz {
                high += e;
            }
        }
    }
    if total <= f64::EPSILON {
        0.0
    } else {
        (high / total) as f32
    }
}

/// Summary statistics of an unsigned 8-bit run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub mean: f32,
    pub std_dev: f32,
    pub min: u8,
    pub max: u8,
    /// Mean of `|s - 128|`.
    pub mean_abs_deviation: f32,
}

impl SampleStats {
    /// `None` for an empty run.
    pub fn from_samples(samples: &[u8]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut abs_dev = 0.0f64;
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for &s in samples {
            let v = s as f64;
            sum += v;
            sum_sq += v * v;
            abs_dev += (v - MIDPOINT as f64).abs();
            min = min.min(s);
            max = max.max(s);
        }
        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);
        Some(Self {
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
            min,
            max,
            mean_abs_deviation: (abs_dev / n) as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(hz: f32, sr: u32, n: usize) -> Vec<u8> {
        (0..n)
            .map(|i| {
                let v = (std::f32::consts::TAU * hz * i as f32 / sr as f32).sin();
                (128.0 + 100.0 * v) as u8
            })
            .collect()
    }

    #[test]
    fn test_low_tone_has_no_high_energy() {
        let samples = tone(200.0, 11_025, 8_192);
        let r = band_energy_ratio(&samples, 2_000.0, 11_025);
        assert!(r < 0.01, "ratio {r}");
    }

    #[test]
    fn test_high_tone_is_all_high_energy() {
        let samples = tone(4_000.0, 11_025, 8_192);
        let r = band_energy_ratio(&samples, 2_000.0, 11_025);
        assert!(r > 0.99, "ratio {r}");
    }

    #[test]
    fn test_silence_and_empty() {
        assert_eq!(band_energy_ratio(&[], 1_000.0, 11_025), 0.0);
        assert_eq!(band_energy_ratio(&[128; 3_000], 1_000.0, 11_025), 0.0);
    }

    #[test]
    fn test_stats() {
        let stats = SampleStats::from_samples(&[118, 138, 118, 138]).unwrap();
        assert_eq!(stats.mean, 128.0);
        assert_eq!(stats.std_dev, 10.0);
        assert_eq!(stats.min, 118);
        assert_eq!(stats.max, 138);
        assert_eq!(stats.mean_abs_deviation, 10.0);
        assert_eq!(SampleStats::from_samples(&[]), None);
    }
}
