//! Shepard-Risset glissando.
//!
//! Twelve octave-spaced partials ride on a base frequency that glides by one
//! octave every six seconds and wraps back by an octave at the edge of
//! its band. Each partial is weighted by a Gaussian over its log-distance
//! from 440 Hz, so partials fade in at one end of the spectrum as they
//! fade out at the other and the pitch appears to move forever.

use super::Generator;
use super::utils::{Phase, to_centered};

const PARTIALS: usize = 12;
const CENTER_HZ: f32 = 440.0;
const OCTAVE_SECONDS: f32 = 6.0;
const SIGMA: f32 = 0.55;
const AUDIBLE: std::ops::RangeInclusive<f32> = 20.0..=6000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

pub struct Shepard {
    direction: Direction,
    base_hz: f32,
    rate: f32,
    phases: [Phase; PARTIALS],
    sample_rate: f32,
}

impl Shepard {
    pub fn new(direction: Direction, sample_rate: f32) -> Self {
        let base_hz = match direction {
            Direction::Up => CENTER_HZ / 4.0,
            Direction::Down => CENTER_HZ * 4.0,
        };
        Self {
            direction,
            base_hz,
            rate: 2f32.powf(1.0 / (sample_rate * OCTAVE_SECONDS)),
            phases: [Phase::default(); PARTIALS],
            sample_rate,
        }
    }

    pub fn base_hz(&self) -> f32 {
        self.base_hz
    }

    fn glide(&mut self) {
        match self.direction {
            Direction::Up => {
                self.base_hz *= self.rate;
                if self.base_hz > CENTER_HZ * 2.0 {
                    self.base_hz *= 0.5;
                }
            }
            Direction::Down => {
                self.base_hz /= self.rate;
                if self.base_hz < CENTER_HZ * 0.5 {
                    self.base_hz *= 2.0;
                }
            }
        }
    }
}

impl Generator for Shepard {
    fn next_sample(&mut self) -> i32 {
        self.glide();

        let mut sum = 0.0;
        let mut weight_sum = 0.0;
        for (j, phase) in self.phases.iter_mut().enumerate() {
            let octave = j as i32 - (PARTIALS as i32 / 2 - 1);
            let f = self.base_hz * 2f32.powi(octave);
            if !AUDIBLE.contains(&f) {
                continue;
            }

            let p = phase.advance_hz(f, self.sample_rate);
            let o = (f / CENTER_HZ).log2();
            let w = (-0.5 * (o * o) / (SIGMA * SIGMA)).exp();
            sum += w * p.sin();
            weight_sum += w;
        }

        let v = if weight_sum > 0.0 { sum / weight_sum } else { 0.0 };
        to_centered(v, 127.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 11_025.0;

    /// Run until the base first wraps by an octave.
    fn settle(shepard: &mut Shepard) {
        let mut prev = shepard.base_hz();
        for _ in 0..(SR * OCTAVE_SECONDS * 4.0) as usize {
            shepard.next_sample();
            let b = shepard.base_hz();
            let wrapped = match shepard.direction {
                Direction::Up => b < prev,
                Direction::Down => b > prev,
            };
            if wrapped {
                return;
            }
            prev = b;
        }
        panic!("base never wrapped");
    }

    #[test]
    fn test_up_base_stays_in_band_after_first_wrap() {
        let mut shepard = Shepard::new(Direction::Up, SR);
        settle(&mut shepard);
        for _ in 0..(SR * OCTAVE_SECONDS * 2.0) as usize {
            shepard.next_sample();
            let b = shepard.base_hz();
            assert!(b > CENTER_HZ && b <= CENTER_HZ * 2.0, "base escaped band: {b}");
        }
    }

    #[test]
    fn test_down_base_stays_in_band_after_first_wrap() {
        let mut shepard = Shepard::new(Direction::Down, SR);
        settle(&mut shepard);
        for _ in 0..(SR * OCTAVE_SECONDS * 2.0) as usize {
            shepard.next_sample();
            let b = shepard.base_hz();
            assert!(b >= CENTER_HZ * 0.5 && b < CENTER_HZ, "base escaped band: {b}");
        }
    }

    #[test]
    fn test_up_and_down_are_independent_and_bounded() {
        let mut up = Shepard::new(Direction::Up, SR);
        let mut down = Shepard::new(Direction::Down, SR);
        for _ in 0..100_000 {
            let a = up.next_sample();
            let b = down.next_sample();
            assert!(a.abs() <= 127 && b.abs() <= 127);
        }
        assert!(up.base_hz() != down.base_hz());
    }
}
