//! Seams between the engine and its collaborators.

pub mod budget;
pub mod cancellation;
pub mod counts;
pub mod diff_tier;

pub use budget::Budget;
pub use cancellation::{Cancellable, CancellationToken};
pub use counts::{CountsPort, RuleCounts};
pub use diff_tier::DiffTier;
