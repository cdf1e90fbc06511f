//! Scanner data types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ratchet_core::errors::{RatchetErrorCode, ScanError};
use ratchet_core::traits::RuleCounts;
use ratchet_core::types::Match;
use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;

/// A file the scanner could not evaluate. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub code: String,
    pub message: String,
}

impl ScanWarning {
    pub fn from_error(path: PathBuf, error: &ScanError) -> Self {
        Self {
            path,
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Aggregate statistics for a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Candidates after exclusion and rule path filters.
    pub files_considered: usize,
    pub files_scanned: usize,
    pub files_excluded: usize,
    pub files_skipped_large: usize,
    pub files_skipped_binary: usize,
    pub files_skipped_unreadable: usize,
    /// Candidates never started because the budget ran out.
    pub files_not_dispatched: usize,
    pub total_size_bytes: u64,
    pub duration_ms: u64,
}

/// Result of one scan: a fresh snapshot, never mutated after return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Matches per repository-relative path. Only files with matches appear.
    pub matches: BTreeMap<PathBuf, Vec<Match>>,
    /// Sorted by path.
    pub warnings: Vec<ScanWarning>,
    pub stats: ScanStats,
    /// Set when the budget stopped dispatching before every file ran.
    pub partial: bool,
}

impl ScanReport {
    /// All matches in path, then line order.
    pub fn all_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values().flatten()
    }

    pub fn total_matches(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }

    pub fn matches_for_rule(&self, rule: &str) -> Vec<Match> {
        self.all_matches()
            .filter(|m| m.rule == rule)
            .cloned()
            .collect()
    }

    /// Actual count per rule; rules without matches count 0.
    pub fn counts_by_rule(&self, rules: &RuleSet) -> RuleCounts {
        let mut counts: RuleCounts = rules.names().map(|n| (n.to_string(), 0)).collect();
        for m in self.all_matches() {
            if let Some(count) = counts.get_mut(&m.rule) {
                *count += 1;
            }
        }
        counts
    }
}
