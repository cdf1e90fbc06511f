//! Ratchet enforcement: allowed counts, run outcomes, and the engine that
//! ties scanning, comparison and attribution together.

pub mod compare;
pub mod outcome;
pub mod runner;
pub mod store;

pub use compare::RuleDiff;
pub use outcome::{RuleFailure, RunOutcome, RunReport};
pub use runner::{RatchetEngine, TouchedReport};
pub use store::{
    Comparison, UpdateDecision, UpdatePolicy, UpdateReport, ViolationStore, WOULD_INCREASE,
};
