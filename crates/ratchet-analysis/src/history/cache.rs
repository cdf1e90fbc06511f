//! Memoized per-commit git queries.
//!
//! moka in-memory tier (TinyLFU admission, capacity eviction, optional TTL)
//! in front of an optional persistent [`DiffTier`]. Keys name immutable
//! content, so entries are never invalidated for correctness.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;
use ratchet_core::config::CacheConfig;
use ratchet_core::errors::HistoryError;
use ratchet_core::traits::DiffTier;
use ratchet_core::types::FileDiff;

type DiffKey = (String, PathBuf);

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub lookups: u64,
    pub misses: u64,
    /// Misses answered by the persistent tier instead of git.
    pub persistent_hits: u64,
    pub hit_rate: f64,
}

/// Concurrent (commit, path) → added-lines cache.
///
/// Concurrent misses on one key run the fetch once; other callers wait for
/// that result.
pub struct HistoryCache {
    diffs: Cache<DiffKey, Arc<FileDiff>>,
    paths: Cache<String, Arc<Vec<PathBuf>>>,
    persistent: Option<Arc<dyn DiffTier>>,
    lookups: AtomicU64,
    misses: AtomicU64,
    persistent_hits: AtomicU64,
}

impl HistoryCache {
    pub fn new(capacity: u64) -> Self {
        Self::build(capacity, None)
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::build(config.effective_capacity(), config.ttl())
    }

    fn build(capacity: u64, ttl: Option<std::time::Duration>) -> Self {
        let mut diffs = Cache::builder().max_capacity(capacity);
        let mut paths = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            diffs = diffs.time_to_live(ttl);
            paths = paths.time_to_live(ttl);
        }
        Self {
            diffs: diffs.build(),
            paths: paths.build(),
            persistent: None,
            lookups: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            persistent_hits: AtomicU64::new(0),
        }
    }

    /// Consult and write through to `tier` on in-memory misses.
    pub fn with_persistent(mut self, tier: Arc<dyn DiffTier>) -> Self {
        self.persistent = Some(tier);
        self
    }

    /// Cached diff, from memory or the persistent tier. Never queries git.
    pub fn get(&self, commit: &str, path: &Path) -> Option<Arc<FileDiff>> {
        let key = (commit.to_string(), path.to_path_buf());
        if let Some(hit) = self.diffs.get(&key) {
            return Some(hit);
        }
        let diff = Arc::new(self.load_persistent(commit, path)?);
        self.diffs.insert(key, diff.clone());
        Some(diff)
    }

    pub fn put(&self, commit: &str, diff: FileDiff) {
        self.store_persistent(commit, &diff);
        self.diffs
            .insert((commit.to_string(), diff.path.clone()), Arc::new(diff));
    }

    /// Cached diff, or the result of `fetch` run exactly once per key.
    pub fn get_or_fetch<F>(
        &self,
        commit: &str,
        path: &Path,
        fetch: F,
    ) -> Result<Arc<FileDiff>, HistoryError>
    where
        F: FnOnce() -> Result<FileDiff, HistoryError>,
    {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let key = (commit.to_string(), path.to_path_buf());
        self.diffs
            .try_get_with(key, || {
                self.misses.fetch_add(1, Ordering::Relaxed);
                if let Some(diff) = self.load_persistent(commit, path) {
                    self.persistent_hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Arc::new(diff));
                }
                let diff = fetch()?;
                self.store_persistent(commit, &diff);
                Ok(Arc::new(diff))
            })
            .map_err(|e: Arc<HistoryError>| e.as_ref().clone())
    }

    /// Paths changed by `commit`, memoized like diffs (memory tier only).
    pub fn changed_paths_or_fetch<F>(
        &self,
        commit: &str,
        fetch: F,
    ) -> Result<Arc<Vec<PathBuf>>, HistoryError>
    where
        F: FnOnce() -> Result<Vec<PathBuf>, HistoryError>,
    {
        self.paths
            .try_get_with(commit.to_string(), || fetch().map(Arc::new))
            .map_err(|e: Arc<HistoryError>| e.as_ref().clone())
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            lookups.saturating_sub(misses) as f64 / lookups as f64
        };
        CacheStats {
            lookups,
            misses,
            persistent_hits: self.persistent_hits.load(Ordering::Relaxed),
            hit_rate,
        }
    }

    pub fn hit_rate(&self) -> f64 {
        self.stats().hit_rate
    }

    /// Approximate in-memory entry count.
    pub fn len(&self) -> u64 {
        self.diffs.run_pending_tasks();
        self.diffs.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load_persistent(&self, commit: &str, path: &Path) -> Option<FileDiff> {
        let tier = self.persistent.as_ref()?;
        match tier.load(commit, path) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(commit, path = %path.display(), error = %e, "persistent diff lookup failed");
                None
            }
        }
    }

    fn store_persistent(&self, commit: &str, diff: &FileDiff) {
        if let Some(tier) = &self.persistent {
            if let Err(e) = tier.store(commit, diff) {
                tracing::warn!(commit, path = %diff.path.display(), error = %e, "persistent diff write failed");
            }
        }
    }
}

impl std::fmt::Debug for HistoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCache")
            .field("stats", &self.stats())
            .field("persistent", &self.persistent.is_some())
            .finish()
    }
}
