//! Track navigation for the control surface.

use noisebox_core::consts::TRACK_COUNT;
use noisebox_core::{Controls, Selector, selector_for_track};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Master-gain change per volume button press.
pub const VOLUME_STEP: f32 = 0.02;

/// Time spent on each track in shuffle mode.
pub const SHUFFLE_INTERVAL: Duration = Duration::from_secs(12);

/// Current position on the track table. Every move writes the new selector
/// into the shared [`Controls`].
pub struct TrackCursor {
  track: usize,
  controls: Arc<Controls>,
}

impl TrackCursor {
  pub fn new(controls: Arc<Controls>, track: usize) -> Self {
    let mut cursor = Self { track: 0, controls };
    cursor.select(track);
    cursor
  }

  pub fn track(&self) -> usize {
    self.track
  }

  pub fn selector(&self) -> Selector {
    selector_for_track(self.track)
  }

  /// Jump to `track`, wrapping positions past the end of the table.
  pub fn select(&mut self, track: usize) -> Selector {
    self.track = track % TRACK_COUNT;
    let selector = self.selector();
    self.controls.set_selector(selector);
    tracing::info!(track = self.track, selector = %selector, name = selector.name(), "track selected");
    selector
  }

  pub fn next(&mut self) -> Selector {
    self.select((self.track + 1) % TRACK_COUNT)
  }

  pub fn prev(&mut self) -> Selector {
    self.select((self.track + TRACK_COUNT - 1) % TRACK_COUNT)
  }

  /// Jump to a random track other than the current one.
  pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Selector {
    let pick = rng.random_range(0..TRACK_COUNT - 1);
    let track = if pick >= self.track { pick + 1 } else { pick };
    self.select(track)
  }

  pub fn volume_up(&self) -> f32 {
    self.change_volume(VOLUME_STEP)
  }

  pub fn volume_down(&self) -> f32 {
    self.change_volume(-VOLUME_STEP)
  }

  fn change_volume(&self, delta: f32) -> f32 {
    let gain = self.controls.nudge_master_gain(delta);
    tracing::info!(master_gain = gain, "volume");
    gain
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::SmallRng;

  fn cursor(track: usize) -> (Arc<Controls>, TrackCursor) {
    let controls = Arc::new(Controls::default());
    let cursor = TrackCursor::new(controls.clone(), track);
    (controls, cursor)
  }

  #[test]
  fn test_new_applies_selector() {
    let (controls, cursor) = cursor(17);
    assert_eq!(cursor.selector(), Selector::Pwm);
    assert_eq!(controls.selector(), Some(Selector::Pwm));
  }

  #[test]
  fn test_next_and_prev_wrap() {
    let (controls, mut cursor) = cursor(TRACK_COUNT - 1);
    assert_eq!(cursor.next(), Selector::White);
    assert_eq!(cursor.track(), 0);
    assert_eq!(cursor.prev(), Selector::AliasingBuzz);
    assert_eq!(controls.selector(), Some(Selector::AliasingBuzz));
    assert_eq!(cursor.select(TRACK_COUNT + 2), Selector::Brown);
  }

  #[test]
  fn test_shuffle_never_repeats_and_covers_table() {
    let (_, mut cursor) = cursor(0);
    let mut rng = SmallRng::seed_from_u64(3);
    let mut seen = [false; TRACK_COUNT];
    for _ in 0..2_000 {
      let before = cursor.track();
      cursor.shuffle(&mut rng);
      assert_ne!(cursor.track(), before);
      seen[cursor.track()] = true;
    }
    assert!(seen.iter().all(|&s| s));
  }

  #[test]
  fn test_volume_steps_saturate() {
    let (controls, cursor) = cursor(0);
    controls.set_master_gain(0.97);
    assert!((cursor.volume_up() - 0.99).abs() < 1e-6);
    assert_eq!(cursor.volume_up(), 1.0);
    controls.set_master_gain(0.01);
    assert_eq!(cursor.volume_down(), 0.0);
  }
}
