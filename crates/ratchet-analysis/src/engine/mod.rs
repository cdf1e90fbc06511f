//! Pattern engine: evaluates one rule against one file's text.
//!
//! Pure and synchronous. Results are sorted by line and deduplicated on
//! (rule, path, line, text).

pub mod single_pass;
pub mod two_pass;

use std::path::Path;

use ratchet_core::constants;
use ratchet_core::types::Match;

use crate::rules::{Rule, RuleKind};

/// Evaluate `rule` against `text`, reporting matches under `path`.
///
/// File-path filters are not applied here; callers decide which files a
/// rule sees.
pub fn evaluate(rule: &Rule, path: &Path, text: &str) -> Vec<Match> {
    let mut matches = match rule.kind() {
        RuleKind::Line => single_pass::evaluate_lines(rule, path, text),
        RuleKind::WholeText => single_pass::evaluate_whole_text(rule, path, text),
        RuleKind::TwoPass(span) => two_pass::evaluate_spans(rule, span, path, text),
    };
    matches.sort();
    matches.dedup();
    matches
}

/// Indentation width of `line`: a space is one column, a tab advances to
/// the next multiple of the tab width.
pub fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width += constants::TAB_WIDTH - (width % constants::TAB_WIDTH),
            _ => break,
        }
    }
    width
}

/// Lines of `text` without terminators (`\n` or `\r\n`).
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}
