//! RatchetEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Observer for engine progress.
///
/// Handlers override only the events they care about. `Send + Sync`
/// because scan events fire from worker threads.
pub trait RatchetEventHandler: Send + Sync {
    // ---- Scan ----
    fn on_scan_started(&self, _event: &ScanStartedEvent) {}
    fn on_file_skipped(&self, _event: &FileSkippedEvent) {}
    fn on_scan_complete(&self, _event: &ScanCompleteEvent) {}

    // ---- Enforcement ----
    fn on_regression_detected(&self, _event: &RegressionDetectedEvent) {}
    fn on_update_rejected(&self, _event: &UpdateRejectedEvent) {}
    fn on_loosening_applied(&self, _event: &LooseningAppliedEvent) {}

    // ---- History ----
    fn on_commit_visited(&self, _event: &CommitVisitedEvent) {}
    fn on_attribution_complete(&self, _event: &AttributionCompleteEvent) {}
}

/// Handler that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl RatchetEventHandler for NoOpHandler {}
