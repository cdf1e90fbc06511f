//! History attribution configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HistoryConfig {
    /// Base reference for "changed files" mode. Default: `origin/main`.
    pub base_ref: Option<String>,
    /// Reference the history walk starts from. Default: `HEAD`.
    pub head_ref: Option<String>,
    /// Maximum first-parent commits visited per attribution. Default: 200.
    pub commit_budget: Option<usize>,
    /// Wall-clock limit for a history walk, in seconds.
    pub deadline_secs: Option<u64>,
    /// Number of attributions reported. Default: 10.
    pub attribution_limit: Option<usize>,
    /// Attribute uncommitted lines to the working tree first. Default: true.
    pub include_working_tree: Option<bool>,
}

impl HistoryConfig {
    pub fn effective_base_ref(&self) -> &str {
        self.base_ref.as_deref().unwrap_or(constants::DEFAULT_BASE_REF)
    }

    pub fn effective_head_ref(&self) -> &str {
        self.head_ref.as_deref().unwrap_or(constants::DEFAULT_HEAD_REF)
    }

    pub fn effective_commit_budget(&self) -> usize {
        self.commit_budget.unwrap_or(constants::DEFAULT_COMMIT_BUDGET)
    }

    pub fn effective_attribution_limit(&self) -> usize {
        self.attribution_limit
            .unwrap_or(constants::DEFAULT_ATTRIBUTION_LIMIT)
    }

    pub fn effective_include_working_tree(&self) -> bool {
        self.include_working_tree.unwrap_or(true)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}
