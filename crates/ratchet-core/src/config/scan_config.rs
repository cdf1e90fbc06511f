//! Scanner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the repository scanner.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum file size in bytes. Default: 1MB.
    pub max_file_size: Option<u64>,
    /// Worker threads. 0 = auto-detect.
    pub threads: Option<usize>,
    /// Stop dispatching files after this many. Unbounded when unset.
    pub max_files: Option<usize>,
    /// Wall-clock limit for a scan, in seconds.
    pub deadline_secs: Option<u64>,
    /// Name of per-directory ignore files. Default: `.ratchetignore`.
    pub ignore_file_name: Option<String>,
    /// Extra root-level exclusion patterns, appended after the defaults.
    #[serde(default)]
    pub extra_exclude: Vec<String>,
    /// Skip files whose first 8KB contain a NUL byte. Default: true.
    pub skip_binary: Option<bool>,
}

impl ScanConfig {
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(constants::DEFAULT_MAX_FILE_SIZE)
    }

    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(0)
    }

    pub fn effective_ignore_file_name(&self) -> &str {
        self.ignore_file_name
            .as_deref()
            .unwrap_or(constants::DEFAULT_IGNORE_FILE)
    }

    pub fn effective_skip_binary(&self) -> bool {
        self.skip_binary.unwrap_or(true)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}
