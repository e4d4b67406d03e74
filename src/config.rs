//! Tool configuration, read from an optional TOML file.
//!
//! ```toml
//! data_dir = "data"
//! lineups_file = "lineups.json"
//! history_file = "lineups_historical.json"
//!
//! [identifiers]
//! length = 5
//! max_attempts = 1000
//! scope = "artist_name"     # or "identity_key"
//!
//! [history]
//! valid_from = "first_seen" # or "change_timestamp"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::history::{
    DEFAULT_ID_LENGTH, DEFAULT_MAX_ID_ATTEMPTS, IdScope, ReconcileOptions, ValidFromPolicy,
};
use crate::{HistoryError, HistoryResult};

pub const DEFAULT_CONFIG_FILE: &str = "lineup-history.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub lineups_file: String,
    pub history_file: String,
    pub identifiers: IdentifierConfig,
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            lineups_file: "lineups.json".to_string(),
            history_file: "lineups_historical.json".to_string(),
            identifiers: IdentifierConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub length: usize,
    pub max_attempts: usize,
    pub scope: IdScope,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        IdentifierConfig {
            length: DEFAULT_ID_LENGTH,
            max_attempts: DEFAULT_MAX_ID_ATTEMPTS,
            scope: IdScope::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub valid_from: ValidFromPolicy,
}

impl Config {
    /// Load `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> HistoryResult<Config> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let s = std::fs::read_to_string(path).map_err(|e| HistoryError::Message(e.to_string()))?;
        Config::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> HistoryResult<Config> {
        let cfg: Config = toml::from_str(s)
            .map_err(|e| HistoryError::Message(format!("invalid config: {e}")))?;
        if cfg.identifiers.length == 0 {
            return Err(HistoryError::Message(
                "invalid config: identifiers.length must be at least 1".to_string(),
            ));
        }
        Ok(cfg)
    }

    pub fn lineups_path(&self) -> PathBuf {
        self.data_dir.join(&self.lineups_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            id_length: self.identifiers.length,
            max_id_attempts: self.identifiers.max_attempts,
            id_scope: self.identifiers.scope,
            valid_from: self.history.valid_from,
        }
    }
}
