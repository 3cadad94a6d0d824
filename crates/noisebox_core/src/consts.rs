//! Engine-wide constants.

/// Default engine rate. Every generator receives the configured rate at
/// construction, so this is only the fallback for configs that omit it.
pub const SAMPLE_RATE_HZ: u32 = 11_025;

/// Zero / DC-centre of the unsigned 8-bit output.
pub const MIDPOINT: u8 = 128;

/// Gain used for selectors that have no entry in a [`crate::GainTable`].
pub const DEFAULT_GAIN: f32 = 0.65;

/// Number of tracks on the track table.
pub const TRACK_COUNT: usize = 46;

/// Capacity of the visualization ring (power of two).
pub const VIS_RING_SIZE: usize = 1024;
pub const VIS_RING_MASK: usize = VIS_RING_SIZE - 1;

/// Accepted engine rates.
pub const MIN_SAMPLE_RATE: u32 = 1_000;
pub const MAX_SAMPLE_RATE: u32 = 192_000;
