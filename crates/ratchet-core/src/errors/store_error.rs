//! Persistence errors for the counts file and the diff cache tier.

use super::error_code::{self, RatchetErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Malformed counts file {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("Could not lock {path}: {message}")]
    Lock { path: String, message: String },

    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration to v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },
}

impl RatchetErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Lock { .. } => error_code::LOCK_FAILED,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
