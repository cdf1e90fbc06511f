//! # ratchet-core
//!
//! Foundation crate for the ratchet engine:
//! - Errors: one `thiserror` enum per subsystem plus the aggregate `RatchetError`
//! - Config: TOML settings with CLI > env > project > user > default resolution
//! - Tracing: `RATCHET_LOG`-driven subscriber setup
//! - Traits: run budgets, cancellation, and the persistence ports
//! - Events: observer trait with no-op defaults
//! - Types: matches, commit records, diffs

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod traits;
pub mod types;

pub use errors::{RatchetError, RatchetErrorCode};
pub use types::{AddedLine, CommitRecord, FileDiff, Match};
