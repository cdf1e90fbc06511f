//! Rule definitions.
//!
//! A rule is immutable once built. Building compiles its patterns and runs
//! its positive and negative examples through the engine, so a rule that
//! exists is a rule that behaves as its examples say.

pub mod builtin;
pub mod loader;
pub mod span;
pub mod types;
pub mod validation;

pub use loader::{RuleDef, RuleFile, RuleLoader, SpanDef};
pub use span::{CaptureTemplate, IndentedBlock, SpanSpec, SpanStrategy};
pub use types::{Rule, RuleBuilder, RuleKind, RuleSet};
