//! Engine configuration, loadable from JSON.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, SAMPLE_RATE_HZ};
use crate::gain::GainTable;
use crate::selector::Selector;

/// Seed used when a config does not name one, so runs are reproducible.
pub const DEFAULT_SEED: u64 = 0x6E6F_6973_6562_6F78;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("sample rate {0} Hz is outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}")]
    InvalidSampleRate(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub seed: u64,
    pub master_gain: f32,
    pub selector: Selector,
    /// Per-selector overrides on top of the built-in gain table.
    pub gains: HashMap<Selector, f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE_HZ,
            seed: DEFAULT_SEED,
            master_gain: 1.0,
            selector: Selector::White,
            gains: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// Built-in gains with this config's overrides applied.
    pub fn gain_table(&self) -> GainTable {
        GainTable::builtin().with_overrides(&self.gains)
    }
}
