//! Persistent tier behind the in-memory history cache.

use std::path::Path;

use crate::errors::StoreError;
use crate::types::FileDiff;

/// Durable (commit, path) → added-lines storage.
///
/// Entries are immutable once written: a commit id names fixed content.
pub trait DiffTier: Send + Sync {
    fn load(&self, commit: &str, path: &Path) -> Result<Option<FileDiff>, StoreError>;

    fn store(&self, commit: &str, diff: &FileDiff) -> Result<(), StoreError>;
}
