//! Version-control history errors.

use super::error_code::{self, RatchetErrorCode};

/// History is unavailable or a query against it failed.
///
/// Fatal for attribution only; a plain ratchet check completes without it.
/// `Clone` so that a failed lookup can be shared with every caller waiting
/// on the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("Not a git repository: {path}")]
    NotARepository { path: String },

    #[error("Reference not found: {reference}")]
    ReferenceNotFound { reference: String },

    #[error("Git query failed: {message}")]
    Git { message: String },
}

impl RatchetErrorCode for HistoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ReferenceNotFound { .. } => error_code::REFERENCE_NOT_FOUND,
            _ => error_code::HISTORY_UNAVAILABLE,
        }
    }
}
