//! Top-level error aggregating every subsystem via `From` conversions.

use super::error_code::{self, RatchetErrorCode};
use super::{ConfigError, HistoryError, RuleError, ScanError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RatchetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Run cancelled")]
    Cancelled,
}

impl RatchetError {
    /// Configuration problems are reported before any scan begins.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Rule(_))
    }
}

impl RatchetErrorCode for RatchetError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Rule(e) => e.error_code(),
            Self::Scan(e) => e.error_code(),
            Self::History(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}
