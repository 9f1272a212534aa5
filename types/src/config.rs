//! Artwork subsystem configuration.

use crate::pixels::{LayoutError, PixelLayout};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cap on the number of words a single store write may carry.
pub const DEFAULT_MAX_BATCH_WORDS: usize = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid pixel layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: usize },
}

/// Limits applied by the artwork data store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_max_batch_words")]
    pub max_batch_words: usize,
}

fn default_max_batch_words() -> usize {
    DEFAULT_MAX_BATCH_WORDS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_batch_words: DEFAULT_MAX_BATCH_WORDS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkConfig {
    #[serde(default)]
    pub layout: PixelLayout,
    #[serde(default)]
    pub store: StoreConfig,
    /// When disabled, every pixel group counts as fully opaque.
    #[serde(default = "default_alpha_enabled")]
    pub alpha_enabled: bool,
}

fn default_alpha_enabled() -> bool {
    true
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            layout: PixelLayout::default(),
            store: StoreConfig::default(),
            alpha_enabled: true,
        }
    }
}

impl ArtworkConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        if self.store.max_batch_words == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "store.max_batch_words",
                value: 0,
            });
        }
        Ok(())
    }
}
