//! Counts file and rule file locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Persisted allowed counts, relative to the repository root.
    pub counts_path: Option<PathBuf>,
    /// Rule definitions, relative to the repository root.
    pub rules_path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn effective_counts_path(&self, root: &Path) -> PathBuf {
        root.join(
            self.counts_path
                .as_deref()
                .unwrap_or_else(|| Path::new(constants::DEFAULT_COUNTS_FILE)),
        )
    }

    pub fn effective_rules_path(&self, root: &Path) -> PathBuf {
        root.join(
            self.rules_path
                .as_deref()
                .unwrap_or_else(|| Path::new(constants::DEFAULT_RULES_FILE)),
        )
    }
}
