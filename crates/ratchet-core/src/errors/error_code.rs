//! RatchetErrorCode trait for stable, machine-readable error codes.

/// Every error enum implements this to expose a structured code that
/// embedding programs can match on without parsing messages.
pub trait RatchetErrorCode {
    /// Returns the error code string (e.g., "SCAN_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const RULE_ERROR: &str = "RULE_ERROR";
pub const RULE_VALIDATION_FAILED: &str = "RULE_VALIDATION_FAILED";
pub const SCAN_ERROR: &str = "SCAN_ERROR";
pub const FILE_SKIPPED: &str = "FILE_SKIPPED";
pub const CANCELLED: &str = "CANCELLED";
pub const HISTORY_UNAVAILABLE: &str = "HISTORY_UNAVAILABLE";
pub const REFERENCE_NOT_FOUND: &str = "REFERENCE_NOT_FOUND";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const LOCK_FAILED: &str = "LOCK_FAILED";
