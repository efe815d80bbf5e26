// File: src/config.rs
use crate::error::PhraseError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Runtime settings for a phrase session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// CMS rule export (JSON).
    pub rules_path: Option<PathBuf>,

    /// Binary cache of the validated rules.
    pub snapshot_path: Option<PathBuf>,

    /// Longest phrase accepted; 0 means unlimited.
    pub max_tokens: usize,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            snapshot_path: None,
            max_tokens: 0,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, PhraseError> {
        let text = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PhraseError> {
        if let (Some(rules), Some(snapshot)) = (&self.rules_path, &self.snapshot_path) {
            if rules == snapshot {
                return Err(PhraseError::Config(format!(
                    "snapshot_path would overwrite the rule export at {}",
                    rules.display()
                )));
            }
        }
        if self.log_filter.trim().is_empty() {
            return Err(PhraseError::Config("log_filter must not be empty".into()));
        }
        Ok(())
    }

    /// Per-user location for the rule snapshot.
    pub fn default_snapshot_path() -> Option<PathBuf> {
        let mut path = dirs::data_local_dir().or_else(dirs::home_dir)?;
        path.push("aac-phrase");
        path.push("rules.snapshot");
        Some(path)
    }
}
