//! # ratchet-analysis
//!
//! The ratchet engine:
//! - Rules: definitions, span strategies, TOML loading, self-validation
//! - Engine: single-pass and two-pass evaluation of a rule over one file
//! - Exclusion: per-directory ignore scopes
//! - Scanner: parallel, budgeted evaluation over a file set
//! - History: git collaborator, commit walk, diff cache, attribution
//! - Ratchet: violation store, run outcomes, the top-level runner

pub mod engine;
pub mod exclusion;
pub mod history;
pub mod ratchet;
pub mod rules;
pub mod scanner;

pub use engine::evaluate;
pub use ratchet::{RatchetEngine, RunOutcome, ViolationStore};
pub use rules::{Rule, RuleKind, RuleSet};
pub use scanner::{FileSet, ScanReport, Scanner};
