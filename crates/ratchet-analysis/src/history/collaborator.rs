//! The engine's only view of version control.

use std::path::{Path, PathBuf};

use ratchet_core::errors::HistoryError;
use ratchet_core::types::{CommitRecord, FileDiff};

/// Version-control queries the engine depends on.
///
/// Paths are repository-relative. `log` follows first parents only, newest
/// first, starting at and including `from_ref` (a reference name or a
/// commit id).
pub trait GitCollaborator: Send + Sync {
    fn tracked_files(&self) -> Result<Vec<PathBuf>, HistoryError>;

    /// Files changed between the merge base of `base_ref` and `HEAD`, and
    /// the working tree. Deleted files are omitted.
    fn changed_files(&self, base_ref: &str) -> Result<Vec<PathBuf>, HistoryError>;

    fn log(&self, from_ref: &str, limit: usize) -> Result<Vec<CommitRecord>, HistoryError>;

    /// Paths a commit added or modified relative to its first parent.
    fn changed_paths(&self, commit: &str) -> Result<Vec<PathBuf>, HistoryError>;

    /// Lines `commit` added to `path` relative to its first parent.
    fn file_diff(&self, commit: &str, path: &Path) -> Result<FileDiff, HistoryError>;

    /// Lines added to `path` in the working tree relative to `HEAD`.
    fn worktree_diff(&self, path: &Path) -> Result<FileDiff, HistoryError>;

    /// Every file a commit touched, with its added lines.
    fn diff(&self, commit: &str) -> Result<Vec<FileDiff>, HistoryError> {
        self.changed_paths(commit)?
            .iter()
            .map(|path| self.file_diff(commit, path))
            .collect()
    }
}
