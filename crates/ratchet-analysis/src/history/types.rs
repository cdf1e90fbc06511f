//! Attribution results.

use ratchet_core::types::{CommitRecord, Match};
use serde::{Deserialize, Serialize};

/// Where a violation was introduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Uncommitted change; newer than any commit.
    WorkingTree,
    Commit(CommitRecord),
}

impl Origin {
    pub fn label(&self) -> String {
        match self {
            Self::WorkingTree => "working tree".to_string(),
            Self::Commit(commit) => format!("{} {}", commit.short_id(), commit.summary),
        }
    }
}

/// A violation paired with the change that introduced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub violation: Match,
    pub origin: Origin,
    /// Position in traversal order: 0 is the working tree, then 1.. for
    /// commits newest first.
    pub recency: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributionReport {
    /// Newest first; ties by path, then line. Truncated to the caller's limit.
    pub attributions: Vec<Attribution>,
    /// Attributed before truncation.
    pub total_attributed: usize,
    /// Origin unknown within the searched window. Sorted.
    pub unresolved: Vec<Match>,
    pub commits_scanned: usize,
    /// The commit budget or deadline stopped the walk with history left.
    pub budget_exhausted: bool,
    /// The walk reached the first commit.
    pub history_exhausted: bool,
}

impl AttributionReport {
    /// Some matches stayed unresolved because the budget ran out.
    pub fn is_partial(&self) -> bool {
        self.budget_exhausted && !self.unresolved.is_empty()
    }
}
