//! History subsystem: explains when each violation entered the codebase.
//!
//! The walk is sequential along first-parent history; per-commit diffs of
//! the files that still hold pending matches are fetched in parallel and
//! memoized by (commit, path).

pub mod attributor;
pub mod cache;
pub mod collaborator;
pub mod git2_collaborator;
pub mod types;
pub mod walk;

pub use attributor::Attributor;
pub use cache::{CacheStats, HistoryCache};
pub use collaborator::GitCollaborator;
pub use git2_collaborator::Git2Collaborator;
pub use types::{Attribution, AttributionReport, Origin};
pub use walk::CommitWalk;
