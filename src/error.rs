// File: src/error.rs
use thiserror::Error;

/// Errors from loading or saving rule data. Resolution itself never fails.
#[derive(Error, Debug)]
pub enum PhraseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tempfile::PersistError> for PhraseError {
    fn from(err: tempfile::PersistError) -> Self {
        PhraseError::Io(err.error)
    }
}
