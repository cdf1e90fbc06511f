//! Version-control values consumed by the history attributor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::collections::ParentIds;

/// A commit as a traversal node. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub parents: ParentIds,
    /// Committer time, seconds since the Unix epoch.
    pub timestamp: i64,
    pub author: String,
    pub summary: String,
}

impl CommitRecord {
    /// First 8 characters of the id, for log lines.
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

/// A line introduced by a change, at its post-change line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedLine {
    /// 1-based line number in the new version of the file.
    pub line: usize,
    pub text: String,
}

/// Lines one change added to one file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: PathBuf,
    pub added: Vec<AddedLine>,
}

impl FileDiff {
    pub fn new(path: impl Into<PathBuf>, added: Vec<AddedLine>) -> Self {
        Self {
            path: path.into(),
            added,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}
