//! Track index → selector lookup used by the control surface.
//!
//! Blue noise has no track; it is reachable by selector only.

use crate::consts::TRACK_COUNT;
use crate::selector::Selector;

/// Selector for a track position. Out-of-range positions play white noise.
pub fn selector_for_track(track: usize) -> Selector {
    match track {
        0 => Selector::White,
        1 => Selector::Pink,
        2 => Selector::Brown,
        3 => Selector::Violet,
        // The rest follow ordinal order from Sine onwards.
        4..TRACK_COUNT => Selector::from_index((track + 1) as u8).unwrap_or(Selector::White),
        _ => Selector::White,
    }
}

/// Track position of a selector, if it has one.
pub fn track_for_selector(selector: Selector) -> Option<usize> {
    (0..TRACK_COUNT).find(|&t| selector_for_track(t) == selector)
}

/// Every track in order.
pub fn tracks() -> impl Iterator<Item = (usize, Selector)> {
    (0..TRACK_COUNT).map(|t| (t, selector_for_track(t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_front_panel_positions() {
        assert_eq!(selector_for_track(0), Selector::White);
        assert_eq!(selector_for_track(3), Selector::Violet);
        assert_eq!(selector_for_track(4), Selector::Sine);
        assert_eq!(selector_for_track(9), Selector::ShepardUp);
        assert_eq!(selector_for_track(17), Selector::Pwm);
        assert_eq!(selector_for_track(30), Selector::SuperSquare);
        assert_eq!(selector_for_track(45), Selector::AliasingBuzz);
    }

    #[test]
    fn test_out_of_range_plays_white() {
        assert_eq!(selector_for_track(46), Selector::White);
        assert_eq!(selector_for_track(usize::MAX), Selector::White);
    }

    #[test]
    fn test_every_selector_but_blue_has_exactly_one_track() {
        for &s in Selector::ALL {
            let count = tracks().filter(|&(_, t)| t == s).count();
            let expected = if s == Selector::Blue { 0 } else { 1 };
            assert_eq!(count, expected, "{s} appears {count} times");
        }
        assert_eq!(track_for_selector(Selector::Blue), None);
        assert_eq!(track_for_selector(Selector::Doppler), Some(43));
    }
}
