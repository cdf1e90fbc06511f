//! EventDispatcher: synchronous fan-out to registered handlers.

use std::sync::Arc;

use super::handler::RatchetEventHandler;
use super::types::*;

/// Handlers that panic are caught and logged; later handlers still
/// receive the event.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn RatchetEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn RatchetEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn emit<F: Fn(&dyn RatchetEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                ::tracing::warn!("event handler panicked; continuing");
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl RatchetEventHandler for EventDispatcher {
    fn on_scan_started(&self, event: &ScanStartedEvent) {
        self.emit(|h| h.on_scan_started(event));
    }

    fn on_file_skipped(&self, event: &FileSkippedEvent) {
        self.emit(|h| h.on_file_skipped(event));
    }

    fn on_scan_complete(&self, event: &ScanCompleteEvent) {
        self.emit(|h| h.on_scan_complete(event));
    }

    fn on_regression_detected(&self, event: &RegressionDetectedEvent) {
        self.emit(|h| h.on_regression_detected(event));
    }

    fn on_update_rejected(&self, event: &UpdateRejectedEvent) {
        self.emit(|h| h.on_update_rejected(event));
    }

    fn on_loosening_applied(&self, event: &LooseningAppliedEvent) {
        self.emit(|h| h.on_loosening_applied(event));
    }

    fn on_commit_visited(&self, event: &CommitVisitedEvent) {
        self.emit(|h| h.on_commit_visited(event));
    }

    fn on_attribution_complete(&self, event: &AttributionCompleteEvent) {
        self.emit(|h| h.on_attribution_complete(event));
    }
}
