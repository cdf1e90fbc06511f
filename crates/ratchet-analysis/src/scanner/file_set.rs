//! Which files a scan covers.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use ratchet_core::errors::{HistoryError, RatchetError, ScanError};

use crate::exclusion::ExclusionScopes;
use crate::history::GitCollaborator;

/// The candidate files of a scan, before exclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSet {
    /// Every file under the root, `.git` and excluded directories pruned.
    WorkingTree,
    /// Files in the git index.
    Tracked,
    /// Files changed relative to the merge base with a reference.
    ChangedSince(String),
    /// Caller-provided paths, absolute or root-relative.
    Explicit(Vec<PathBuf>),
}

impl FileSet {
    /// Whether this set covers the whole repository.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::WorkingTree | Self::Tracked)
    }

    /// Root-relative candidate paths, sorted and deduplicated.
    pub fn resolve(
        &self,
        root: &Path,
        scopes: &ExclusionScopes,
        git: Option<&dyn GitCollaborator>,
    ) -> Result<Vec<PathBuf>, RatchetError> {
        let mut paths = match self {
            Self::WorkingTree => walk_working_tree(root, scopes)?,
            Self::Tracked => require(git)?.tracked_files()?,
            Self::ChangedSince(base) => require(git)?.changed_files(base)?,
            Self::Explicit(paths) => paths
                .iter()
                .map(|p| p.strip_prefix(root).unwrap_or(p).to_path_buf())
                .collect(),
        };
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

fn require(git: Option<&dyn GitCollaborator>) -> Result<&dyn GitCollaborator, HistoryError> {
    git.ok_or_else(|| HistoryError::Git {
        message: "file set requires a git collaborator".to_string(),
    })
}

fn walk_working_tree(root: &Path, scopes: &ExclusionScopes) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootUnavailable {
            path: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let prune_scopes = scopes.clone();
    let prune_root = root.to_path_buf();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .filter_entry(move |entry| {
            if entry.file_name() == ".git" {
                return false;
            }
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir {
                return true;
            }
            match entry.path().strip_prefix(&prune_root) {
                Ok(rel) if !rel.as_os_str().is_empty() => !prune_scopes.is_excluded(rel, true),
                _ => true,
            }
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                if let Ok(rel) = entry.path().strip_prefix(root) {
                    files.push(rel.to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "walk error; entry skipped"),
        }
    }
    Ok(files)
}
