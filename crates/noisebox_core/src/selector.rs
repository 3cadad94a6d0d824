//! The closed set of generator algorithms and their metadata.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A selector string or index that names no generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown selector `{0}`")]
pub struct UnknownSelector(pub String);

macro_rules! selectors {
    ($($variant:ident => $id:literal, $name:literal, $gain:literal;)+) => {
        /// Identity of one synthesis algorithm.
        ///
        /// Ordinals are stable; they are what the lock-free control cell
        /// stores.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum Selector {
            $($variant,)+
        }

        impl Selector {
            /// Every selector in ordinal order.
            pub const ALL: &'static [Selector] = &[$(Selector::$variant,)+];
            pub const COUNT: usize = Self::ALL.len();

            /// Stable kebab-case identifier used by the CLI and config files.
            pub const fn id(self) -> &'static str {
                match self {
                    $(Selector::$variant => $id,)+
                }
            }

            /// Human-readable name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Selector::$variant => $name,)+
                }
            }

            /// Loudness-normalization multiplier tuned against the
            /// generator's native output scale.
            pub const fn builtin_gain(self) -> f32 {
                match self {
                    $(Selector::$variant => $gain,)+
                }
            }
        }
    };
}

selectors! {
    White              => "white",               "White",               0.55;
    Pink               => "pink",                "Pink",                0.75;
    Brown              => "brown",               "Brown",               0.85;
    Blue               => "blue",                "Blue",                0.60;
    Violet             => "violet",              "Violet",              0.55;
    Sine               => "sine",                "Sine 440",            0.70;
    Square             => "square",              "Square 440",          0.50;
    Triangle           => "triangle",            "Triangle 440",        0.70;
    Saw                => "saw",                 "Saw 220",             0.60;
    Chirp              => "chirp",               "Chirp 200-1200",      0.65;
    ShepardUp          => "shepard-up",          "Shepard Up",          0.70;
    FmBell             => "fm-bell",             "FM Bell",             0.60;
    AmTremolo          => "am-tremolo",          "AM Tremolo",          0.70;
    ShepardDown        => "shepard-down",        "Shepard Down",        0.70;
    Karplus            => "karplus",             "Karplus (Pluck)",     0.70;
    ModalDrum          => "modal-drum",          "Modal Drum",          0.75;
    Granular           => "granular",            "Granular",            0.65;
    SuperSaw           => "supersaw",            "SuperSaw",            0.55;
    Pwm                => "pwm",                 "PWM",                 0.60;
    Bitcrush           => "bitcrush",            "Bitcrush",            0.55;
    PhaseDist          => "phase-dist",          "PhaseDist",           0.60;
    Wavefold           => "wavefold",            "Wavefold",            0.60;
    BandpassNoise      => "bandpass-noise",      "Bandpass Noise",      0.65;
    Euclid             => "euclid",              "Euclid Rhythm",       0.60;
    Euclid716          => "euclid-7-16",         "Euclid 7/16",         0.60;
    Poly34             => "poly-3-4",            "Poly 3:4",            0.60;
    RingMod            => "ring-mod",            "Ring Mod",            0.60;
    Chorus             => "chorus",              "Chorus Sines",        0.55;
    SampleHold         => "sample-hold",         "Sample & Hold",       0.55;
    Formant            => "formant",             "Formant Noise",       0.60;
    Sync               => "sync",                "Sync Lead",           0.60;
    SuperSquare        => "supersquare",         "SuperSquare",         0.55;
    Isochronic         => "isochronic",          "Isochronic",          0.65;
    AcousticBeat       => "acoustic-beat",       "Acoustic Beat",       0.65;
    MissingFundamental => "missing-fundamental", "Missing Fundamental", 0.60;
    CombinationTones   => "combination-tones",   "Combination Tones",   0.60;
    Infrasound         => "infrasound",          "Infrasound",          0.55;
    SomaticBass        => "somatic-bass",        "Somatic Bass",        0.70;
    EarResonance       => "ear-resonance",       "Ear Resonance",       0.55;
    NearNyquist        => "near-nyquist",        "Near-Nyquist",        0.50;
    FeedbackHowl       => "feedback-howl",       "Feedback Howl",       0.60;
    FmMetal            => "fm-metal",            "FM Metallic",         0.55;
    Stutter            => "stutter",             "Stutter/Glitch",      0.55;
    Phaser             => "phaser",              "Phaser/Flanger",      0.60;
    Doppler            => "doppler",             "Doppler",             0.60;
    GatedReverb        => "gated-reverb",        "Gated Reverb",        0.60;
    AliasingBuzz       => "aliasing-buzz",       "Aliasing Buzz",       0.55;
}

lazy_static! {
    static ref BY_ID: HashMap<&'static str, Selector> =
        Selector::ALL.iter().map(|&s| (s.id(), s)).collect();
}

impl Selector {
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Selector for a raw ordinal, or `None` if no generator has it.
    #[inline]
    pub fn from_index(index: u8) -> Option<Selector> {
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Selector {
    type Err = UnknownSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        BY_ID
            .get(key.as_str())
            .copied()
            .ok_or_else(|| UnknownSelector(s.to_string()))
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_dense_and_stable() {
        assert_eq!(Selector::COUNT, 47);
        for (i, s) in Selector::ALL.iter().enumerate() {
            assert_eq!(s.index() as usize, i);
            assert_eq!(Selector::from_index(i as u8), Some(*s));
        }
        assert_eq!(Selector::Blue.index(), 3);
        assert_eq!(Selector::Pwm.index(), 18);
        assert_eq!(Selector::AliasingBuzz.index(), 46);
        assert_eq!(Selector::from_index(47), None);
        assert_eq!(Selector::from_index(255), None);
    }

    #[test]
    fn test_ids_are_unique_and_parse_back() {
        assert_eq!(BY_ID.len(), Selector::COUNT);
        for &s in Selector::ALL {
            assert_eq!(s.id().parse::<Selector>(), Ok(s));
            assert_eq!(s.to_string(), s.id());
        }
    }

    #[test]
    fn test_parse_is_forgiving_about_case_and_underscores() {
        assert_eq!("Shepard_Up".parse::<Selector>(), Ok(Selector::ShepardUp));
        assert_eq!("  WHITE ".parse::<Selector>(), Ok(Selector::White));
    }

    #[test]
    fn test_unknown_selector_error() {
        let err = "theremin".parse::<Selector>().unwrap_err();
        assert_eq!(err, UnknownSelector("theremin".into()));
        assert_eq!(err.to_string(), "unknown selector `theremin`");
    }

    #[test]
    fn test_builtin_gains_are_normalized() {
        for &s in Selector::ALL {
            let g = s.builtin_gain();
            assert!((0.0..=1.0).contains(&g), "{s} gain {g}");
        }
        assert_eq!(Selector::White.builtin_gain(), 0.55);
        assert_eq!(Selector::Brown.builtin_gain(), 0.85);
    }

    #[test]
    fn test_serde_uses_id() {
        let json = serde_json::to_string(&Selector::Euclid716).unwrap();
        assert_eq!(json, "\"euclid-7-16\"");
        let back: Selector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Selector::Euclid716);
        assert!(serde_json::from_str::<Selector>("\"nope\"").is_err());
    }
}
