//! Runtime configuration for the linking service.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! validity_window_ms = 600000
//! bound_future_timestamps = true
//! max_future_skew_ms = 60000
//! max_display_name_len = 64
//! max_field_len = 256
//! max_badges_per_batch = 64
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DEFAULT_VALIDITY_WINDOW_MS;

pub const DEFAULT_MAX_FUTURE_SKEW_MS: u64 = 60_000;
pub const DEFAULT_MAX_DISPLAY_NAME_LEN: usize = 64;
pub const DEFAULT_MAX_FIELD_LEN: usize = 256;
pub const DEFAULT_MAX_BADGES_PER_BATCH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkingConfig {
    /// Maximum age of an attestation, in milliseconds. Inclusive.
    pub validity_window_ms: u64,

    /// Reject attestations timestamped further than `max_future_skew_ms`
    /// ahead of the local clock.
    pub bound_future_timestamps: bool,

    /// How far ahead of the local clock an attestation timestamp may be.
    pub max_future_skew_ms: u64,

    /// Maximum display name length in bytes.
    pub max_display_name_len: usize,

    /// Maximum length in bytes of chain, address, platform, username and
    /// every badge text field.
    pub max_field_len: usize,

    /// Maximum number of badges accepted in one mint batch.
    pub max_badges_per_batch: usize,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            validity_window_ms: DEFAULT_VALIDITY_WINDOW_MS,
            bound_future_timestamps: true,
            max_future_skew_ms: DEFAULT_MAX_FUTURE_SKEW_MS,
            max_display_name_len: DEFAULT_MAX_DISPLAY_NAME_LEN,
            max_field_len: DEFAULT_MAX_FIELD_LEN,
            max_badges_per_batch: DEFAULT_MAX_BADGES_PER_BATCH,
        }
    }
}

impl LinkingConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Future-skew bound to enforce, if any.
    #[must_use]
    pub const fn future_skew_bound(&self) -> Option<u64> {
        if self.bound_future_timestamps {
            Some(self.max_future_skew_ms)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validity_window_ms == 0 {
            return Err(ConfigError::Validation("validity_window_ms must be non-zero"));
        }
        if self.max_display_name_len == 0 {
            return Err(ConfigError::Validation("max_display_name_len must be non-zero"));
        }
        if self.max_field_len == 0 {
            return Err(ConfigError::Validation("max_field_len must be non-zero"));
        }
        if self.max_badges_per_batch == 0 {
            return Err(ConfigError::Validation("max_badges_per_batch must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Validation(&'static str),
}
