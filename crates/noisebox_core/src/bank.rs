use crate::dsp::Generator;
use crate::selector::Selector;
use crate::voice::Voice;

/// Registry owning one [`Voice`] per selector, indexed by ordinal.
///
/// Built once with every generator's state allocated up front; nothing is
/// ever reset or dropped while the bank lives, so a voice that is selected
/// again resumes exactly where it stopped.
pub struct GeneratorBank {
    voices: Box<[Voice]>,
}

impl GeneratorBank {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let voices = Selector::ALL
            .iter()
            .map(|&s| Voice::new(s, sample_rate, seed))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { voices }
    }

    /// Advance the voice for `selector` by one sample.
    #[inline]
    pub fn next_raw(&mut self, selector: Selector) -> i32 {
        self.voices[selector.index() as usize].next_sample()
    }

    pub fn voice(&self, selector: Selector) -> &Voice {
        &self.voices[selector.index() as usize]
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_is_indexed_by_ordinal() {
        let bank = GeneratorBank::new(11_025.0, 0);
        assert_eq!(bank.len(), Selector::COUNT);
        for &s in Selector::ALL {
            assert_eq!(bank.voice(s).selector(), s);
        }
    }
}
