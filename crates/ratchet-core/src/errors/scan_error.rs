//! Scanner errors.

use std::path::PathBuf;

use super::error_code::{self, RatchetErrorCode};

/// Errors that can occur during file scanning.
///
/// Everything except `RootUnavailable` is recovered by the scanner and
/// reported as a warning.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("IO error scanning {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Binary file skipped: {path}")]
    BinaryFile { path: PathBuf },

    #[error("File is not valid UTF-8: {path}")]
    NotUtf8 { path: PathBuf },

    #[error("File too large: {path} ({size} bytes, max {max})")]
    MaxFileSizeExceeded { path: PathBuf, size: u64, max: u64 },

    #[error("Scan root unavailable: {path}: {message}")]
    RootUnavailable { path: PathBuf, message: String },

    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// True when the scan can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::RootUnavailable { .. } | Self::Cancelled)
    }
}

impl RatchetErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            Self::BinaryFile { .. } | Self::NotUtf8 { .. } | Self::MaxFileSizeExceeded { .. } => {
                error_code::FILE_SKIPPED
            }
            _ => error_code::SCAN_ERROR,
        }
    }
}
