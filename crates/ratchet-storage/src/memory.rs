//! In-process counts port.

use std::sync::Mutex;

use ratchet_core::errors::StoreError;
use ratchet_core::traits::{CountsPort, RuleCounts};

/// Counts held in memory; nothing touches disk.
#[derive(Debug, Default)]
pub struct MemoryCounts {
    counts: Mutex<RuleCounts>,
}

impl MemoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counts(counts: RuleCounts) -> Self {
        Self {
            counts: Mutex::new(counts),
        }
    }

    /// Copy of the last saved map.
    pub fn snapshot(&self) -> RuleCounts {
        self.counts.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CountsPort for MemoryCounts {
    fn load(&self) -> Result<RuleCounts, StoreError> {
        self.counts
            .lock()
            .map(|c| c.clone())
            .map_err(|_| StoreError::Lock {
                path: self.location(),
                message: "counts mutex poisoned".to_string(),
            })
    }

    fn save(&self, counts: &RuleCounts) -> Result<(), StoreError> {
        let mut guard = self.counts.lock().map_err(|_| StoreError::Lock {
            path: self.location(),
            message: "counts mutex poisoned".to_string(),
        })?;
        *guard = counts.clone();
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
