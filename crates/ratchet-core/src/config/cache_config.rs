//! History cache configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum in-memory entries. Default: 10,000.
    pub capacity: Option<u64>,
    /// Optional time-to-live for in-memory entries, in seconds.
    pub ttl_secs: Option<u64>,
    /// SQLite file backing the persistent diff tier. Disabled when unset.
    pub persist_path: Option<PathBuf>,
}

impl CacheConfig {
    pub fn effective_capacity(&self) -> u64 {
        self.capacity.unwrap_or(constants::DEFAULT_CACHE_CAPACITY)
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}
