//! Exclusion scopes: which files the scanner never looks at.

pub mod scopes;

pub use scopes::{parse_ignore_file, ExclusionScopes};
