//! Located rule violations.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One located violation.
///
/// Equality covers all four fields. The derived ordering compares path,
/// then line, then rule and text, which gives the stable report order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Match {
    /// Repository-relative path.
    pub path: PathBuf,
    /// 1-based; span start for two-pass rules.
    pub line: usize,
    pub rule: String,
    /// Full source line, trailing whitespace trimmed.
    pub text: String,
}

impl Match {
    pub fn new(rule: impl Into<String>, path: impl Into<PathBuf>, line: usize, text: &str) -> Self {
        Self {
            path: path.into(),
            line,
            rule: rule.into(),
            text: text.trim_end().to_string(),
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}",
            self.path.display(),
            self.line,
            self.rule,
            self.text
        )
    }
}
