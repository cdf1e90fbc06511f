//! Event payload types.

use std::path::PathBuf;

/// Payload for `on_scan_started`.
#[derive(Debug, Clone)]
pub struct ScanStartedEvent {
    pub root: PathBuf,
    pub file_count: usize,
    pub rule_count: usize,
}

/// Payload for `on_file_skipped`.
#[derive(Debug, Clone)]
pub struct FileSkippedEvent {
    pub path: PathBuf,
    pub reason: String,
}

/// Payload for `on_scan_complete`.
#[derive(Debug, Clone)]
pub struct ScanCompleteEvent {
    pub files_scanned: usize,
    pub matches: usize,
    pub partial: bool,
    pub duration_ms: u64,
}

/// Payload for `on_regression_detected`.
#[derive(Debug, Clone)]
pub struct RegressionDetectedEvent {
    pub rule: String,
    pub allowed: u64,
    pub actual: u64,
}

/// Payload for `on_update_rejected`.
#[derive(Debug, Clone)]
pub struct UpdateRejectedEvent {
    pub rule: String,
    pub allowed: u64,
    pub proposed: u64,
}

/// Payload for `on_loosening_applied`.
#[derive(Debug, Clone)]
pub struct LooseningAppliedEvent {
    pub rule: String,
    pub previous: u64,
    pub new: u64,
}

/// Payload for `on_commit_visited`.
#[derive(Debug, Clone)]
pub struct CommitVisitedEvent {
    pub commit: String,
    pub index: usize,
    pub attributed: usize,
}

/// Payload for `on_attribution_complete`.
#[derive(Debug, Clone)]
pub struct AttributionCompleteEvent {
    pub attributed: usize,
    pub unresolved: usize,
    pub commits_scanned: usize,
    pub budget_exhausted: bool,
}
