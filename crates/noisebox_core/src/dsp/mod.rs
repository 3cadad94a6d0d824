//! Generator algorithms and the primitives they share.

pub mod filters;
pub mod granular;
pub mod illusions;
pub mod modulation;
pub mod noise;
pub mod physical;
pub mod random;
pub mod rhythm;
pub mod shepard;
pub mod tones;
pub mod utils;

/// A stateful algorithm producing one centred sample per call.
///
/// Implementations must not allocate, block or panic, and must keep their
/// output within [-128, 127] and their internal state bounded no matter how
/// many times they are called.
pub trait Generator {
    fn next_sample(&mut self) -> i32;
}
