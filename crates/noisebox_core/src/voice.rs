//! One state-owning variant per selector.

use crate::dsp::Generator;
use crate::dsp::granular::Granular;
use crate::dsp::illusions::{
    AcousticBeat, AliasingBuzz, CombinationTones, Doppler, EarResonance, GatedReverb, Infrasound,
    Isochronic, MissingFundamental, NearNyquist, Phaser, SomaticBass, Stutter,
};
use crate::dsp::modulation::{
    BandpassNoise, Bitcrush, Chorus, Formant, HardSync, PhaseDistortion, RingMod, SampleHold,
    SuperSaw, SuperSquare, Wavefold,
};
use crate::dsp::noise::{BlueNoise, BrownNoise, PinkNoise, VioletNoise, WhiteNoise};
use crate::dsp::physical::{FeedbackHowl, Karplus, ModalDrum};
use crate::dsp::random::NoiseSource;
use crate::dsp::rhythm::{EuclidGate, Polyrhythm};
use crate::dsp::shepard::{Direction, Shepard};
use crate::dsp::tones::{BasicTone, Chirp, Fm, Pwm, Tremolo, Waveform};
use crate::selector::Selector;

macro_rules! voices {
    ($($variant:ident($ty:ty),)+) => {
        /// A generator together with its private state.
        ///
        /// Variant names mirror [`Selector`] one-to-one, so adding a selector
        /// without a voice fails to compile in [`Voice::new`].
        pub enum Voice {
            $($variant($ty),)+
        }

        impl Voice {
            pub fn selector(&self) -> Selector {
                match self {
                    $(Voice::$variant(_) => Selector::$variant,)+
                }
            }
        }

        impl Generator for Voice {
            #[inline]
            fn next_sample(&mut self) -> i32 {
                match self {
                    $(Voice::$variant(g) => g.next_sample(),)+
                }
            }
        }
    };
}

voices! {
    White(WhiteNoise),
    Pink(PinkNoise),
    Brown(BrownNoise),
    Blue(BlueNoise),
    Violet(VioletNoise),
    Sine(BasicTone),
    Square(BasicTone),
    Triangle(BasicTone),
    Saw(BasicTone),
    Chirp(Chirp),
    ShepardUp(Shepard),
    FmBell(Fm),
    AmTremolo(Tremolo),
    ShepardDown(Shepard),
    Karplus(Karplus),
    ModalDrum(ModalDrum),
    Granular(Granular),
    SuperSaw(SuperSaw),
    Pwm(Pwm),
    Bitcrush(Bitcrush),
    PhaseDist(PhaseDistortion),
    Wavefold(Wavefold),
    BandpassNoise(BandpassNoise),
    Euclid(EuclidGate),
    Euclid716(EuclidGate),
    Poly34(Polyrhythm),
    RingMod(RingMod),
    Chorus(Chorus),
    SampleHold(SampleHold),
    Formant(Formant),
    Sync(HardSync),
    SuperSquare(SuperSquare),
    Isochronic(Isochronic),
    AcousticBeat(AcousticBeat),
    MissingFundamental(MissingFundamental),
    CombinationTones(CombinationTones),
    Infrasound(Infrasound),
    SomaticBass(SomaticBass),
    EarResonance(EarResonance),
    NearNyquist(NearNyquist),
    FeedbackHowl(FeedbackHowl),
    FmMetal(Fm),
    Stutter(Stutter),
    Phaser(Phaser),
    Doppler(Doppler),
    GatedReverb(GatedReverb),
    AliasingBuzz(AliasingBuzz),
}

impl Voice {
    /// Build the generator for `selector` with fresh state.
    ///
    /// `seed` is the engine seed; each voice derives its own random source
    /// from it and its ordinal.
    pub fn new(selector: Selector, sample_rate: f32, seed: u64) -> Self {
        let sr = sample_rate;
        let rng = NoiseSource::for_generator(seed, selector.index());
        match selector {
            Selector::White => Voice::White(WhiteNoise::new(rng)),
            Selector::Pink => Voice::Pink(PinkNoise::new(rng)),
            Selector::Brown => Voice::Brown(BrownNoise::new(rng)),
            Selector::Blue => Voice::Blue(BlueNoise::new(rng)),
            Selector::Violet => Voice::Violet(VioletNoise::new(rng)),
            Selector::Sine => Voice::Sine(BasicTone::new(Waveform::Sine, sr, rng)),
            Selector::Square => Voice::Square(BasicTone::new(Waveform::Square, sr, rng)),
            Selector::Triangle => Voice::Triangle(BasicTone::new(Waveform::Triangle, sr, rng)),
            Selector::Saw => Voice::Saw(BasicTone::new(Waveform::Saw, sr, rng)),
            Selector::Chirp => Voice::Chirp(Chirp::new(sr)),
            Selector::ShepardUp => Voice::ShepardUp(Shepard::new(Direction::Up, sr)),
            Selector::FmBell => Voice::FmBell(Fm::bell(sr)),
            Selector::AmTremolo => Voice::AmTremolo(Tremolo::new(sr)),
            Selector::ShepardDown => Voice::ShepardDown(Shepard::new(Direction::Down, sr)),
            Selector::Karplus => Voice::Karplus(Karplus::new(sr, rng)),
            Selector::ModalDrum => Voice::ModalDrum(ModalDrum::new(sr, rng)),
            Selector::Granular => Voice::Granular(Granular::new(sr, rng)),
            Selector::SuperSaw => Voice::SuperSaw(SuperSaw::supersaw(sr)),
            Selector::Pwm => Voice::Pwm(Pwm::new(sr)),
            Selector::Bitcrush => Voice::Bitcrush(Bitcrush::new(sr)),
            Selector::PhaseDist => Voice::PhaseDist(PhaseDistortion::new(sr)),
            Selector::Wavefold => Voice::Wavefold(Wavefold::new(sr)),
            Selector::BandpassNoise => Voice::BandpassNoise(BandpassNoise::new(sr, rng)),
            Selector::Euclid => Voice::Euclid(EuclidGate::tresillo(sr)),
            Selector::Euclid716 => Voice::Euclid716(EuclidGate::seven_sixteen(sr)),
            Selector::Poly34 => Voice::Poly34(Polyrhythm::new(sr)),
            Selector::RingMod => Voice::RingMod(RingMod::new(sr)),
            Selector::Chorus => Voice::Chorus(Chorus::new(sr)),
            Selector::SampleHold => Voice::SampleHold(SampleHold::new(sr, rng)),
            Selector::Formant => Voice::Formant(Formant::new(sr, rng)),
            Selector::Sync => Voice::Sync(HardSync::new(sr)),
            Selector::SuperSquare => Voice::SuperSquare(SuperSquare::supersquare(sr)),
            Selector::Isochronic => Voice::Isochronic(Isochronic::new(sr)),
            Selector::AcousticBeat => Voice::AcousticBeat(AcousticBeat::acoustic_beat(sr)),
            Selector::MissingFundamental => {
                Voice::MissingFundamental(MissingFundamental::new(sr))
            }
            Selector::CombinationTones => Voice::CombinationTones(CombinationTones::new(sr)),
            Selector::Infrasound => Voice::Infrasound(Infrasound::infrasound(sr)),
            Selector::SomaticBass => Voice::SomaticBass(SomaticBass::new(sr)),
            Selector::EarResonance => Voice::EarResonance(EarResonance::new(sr)),
            Selector::NearNyquist => Voice::NearNyquist(NearNyquist::near_nyquist(sr)),
            Selector::FeedbackHowl => Voice::FeedbackHowl(FeedbackHowl::new(sr, rng)),
            Selector::FmMetal => Voice::FmMetal(Fm::metallic(sr)),
            Selector::Stutter => Voice::Stutter(Stutter::new(sr, rng)),
            Selector::Phaser => Voice::Phaser(Phaser::new(sr)),
            Selector::Doppler => Voice::Doppler(Doppler::new(sr)),
            Selector::GatedReverb => Voice::GatedReverb(GatedReverb::new(sr, rng)),
            Selector::AliasingBuzz => Voice::AliasingBuzz(AliasingBuzz::new(sr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_selector_builds_its_own_variant() {
        for &s in Selector::ALL {
            let voice = Voice::new(s, 11_025.0, 1);
            assert_eq!(voice.selector(), s);
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        for &s in Selector::ALL {
            let mut a = Voice::new(s, 11_025.0, 42);
            let mut b = Voice::new(s, 11_025.0, 42);
            for _ in 0..2_000 {
                assert_eq!(a.next_sample(), b.next_sample(), "{s} diverged");
            }
        }
    }
}
