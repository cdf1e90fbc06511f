//! # ratchet-storage
//!
//! Persistence adapters for the ratchet engine:
//! - `JsonCountsFile`: the committed allowed-count file
//! - `MemoryCounts`: in-process counts for tests and dry runs
//! - `SqliteDiffTier`: persistent second tier of the history cache

pub mod diff_tier;
pub mod json_counts;
pub mod memory;
pub mod migrations;
pub mod pragmas;

pub use diff_tier::SqliteDiffTier;
pub use json_counts::JsonCountsFile;
pub use memory::MemoryCounts;

use ratchet_core::errors::StoreError;

pub(crate) fn sqlite_err(e: rusqlite::Error) -> StoreError {
    StoreError::SqliteError {
        message: e.to_string(),
    }
}
