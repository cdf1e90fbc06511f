//! Shared value types.

pub mod collections;
pub mod history;
pub mod matches;

pub use history::{AddedLine, CommitRecord, FileDiff};
pub use matches::Match;
