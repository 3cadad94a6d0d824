//! Sample-generation engine for the noisebox 8-bit synthesizer
//!
//! This crate holds every generator algorithm, the selector/dispatch layer and
//! the gain stage. It is a pure library with no device or file I/O beyond
//! reading a JSON config; pacing and output belong in the host crate.

#[macro_use]
extern crate lazy_static;

pub mod analysis;
pub mod bank;
pub mod config;
pub mod consts;
pub mod controls;
pub mod dsp;
pub mod engine;
pub mod gain;
pub mod selector;
pub mod tracks;
pub mod voice;

// Re-export commonly used items
pub use bank::GeneratorBank;
pub use config::{ConfigError, EngineConfig};
pub use controls::Controls;
pub use engine::{Engine, apply_gain};
pub use gain::GainTable;
pub use selector::{Selector, UnknownSelector};
pub use tracks::{selector_for_track, track_for_selector};
