//! Ledger configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty or
//! missing file yields a working configuration.
//!
//! ```toml
//! tag_duration_secs = 15
//! evict_empty_records = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_TAG_DURATION_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Lifetime of tags created through [`EngagementLedger::tag`](crate::EngagementLedger::tag)
    pub tag_duration_secs: u64,

    /// Drop a subject's record from the registry once it is found empty
    pub evict_empty_records: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tag_duration_secs: DEFAULT_TAG_DURATION_SECS,
            evict_empty_records: true,
        }
    }
}

impl LedgerConfig {
    pub fn tag_duration(&self) -> Duration {
        Duration::from_secs(self.tag_duration_secs)
    }

    /// Reject values that would make every [`EngagementLedger::tag`] call fail.
    ///
    /// [`EngagementLedger::tag`]: crate::EngagementLedger::tag
    pub fn validate(&self) -> Result<(), String> {
        if self.tag_duration_secs == 0 {
            return Err("tag_duration_secs must be greater than zero".to_string());
        }
        let fits = TimeDelta::from_std(self.tag_duration())
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .is_some();
        if !fits {
            return Err(format!(
                "tag_duration_secs = {} is too large",
                self.tag_duration_secs
            ));
        }
        Ok(())
    }
}

/// Load a single TOML config file
pub fn load_file(path: &Path) -> Result<LedgerConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: LedgerConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate().map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults.
///
/// A file that exists but cannot be read or parsed is still an error.
pub fn load_or_default(path: &Path) -> Result<LedgerConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No ledger config found, using defaults");
        return Ok(LedgerConfig::default());
    }
    let config = load_file(path)?;
    tracing::info!(path = %path.display(), ?config, "Loaded ledger config");
    Ok(config)
}

/// `<config_dir>/engage/ledger.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("engage").join("ledger.toml"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
