//! Rule definition errors. All of these are raised while a rule set is
//! being built, before any file is scanned.

use super::error_code::{self, RatchetErrorCode};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuleError {
    #[error("Rule '{rule}': invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        message: String,
    },

    #[error("Rule '{rule}': missing required field '{field}'")]
    MissingField { rule: String, field: String },

    #[error("Rule '{rule}': example was expected to match but did not: {example:?}")]
    ExampleNotMatched { rule: String, example: String },

    #[error("Rule '{rule}': non-example matched at line {line}: {example:?}")]
    NonExampleMatched {
        rule: String,
        example: String,
        line: usize,
    },

    #[error("Duplicate rule name: '{rule}'")]
    DuplicateName { rule: String },

    #[error("Rule '{rule}': invalid span definition: {message}")]
    InvalidSpan { rule: String, message: String },

    #[error("Failed to load rules from {path}: {message}")]
    LoadFailed { path: String, message: String },
}

impl RuleError {
    /// Name of the offending rule, if the error is tied to one.
    pub fn rule_name(&self) -> Option<&str> {
        match self {
            Self::InvalidPattern { rule, .. }
            | Self::MissingField { rule, .. }
            | Self::ExampleNotMatched { rule, .. }
            | Self::NonExampleMatched { rule, .. }
            | Self::DuplicateName { rule }
            | Self::InvalidSpan { rule, .. } => Some(rule),
            Self::LoadFailed { .. } => None,
        }
    }
}

impl RatchetErrorCode for RuleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ExampleNotMatched { .. } | Self::NonExampleMatched { .. } => {
                error_code::RULE_VALIDATION_FAILED
            }
            _ => error_code::RULE_ERROR,
        }
    }
}
