//! Two-pass evaluation for block-scoped rules.
//!
//! The primary pattern marks span starts. For each start, the rule's span
//! strategy derives a secondary pattern; following lines are consumed while
//! they match it. A span ends at the first non-matching line, at end of
//! file, or at a non-blank line indented at or below the start line. Blank
//! lines neither end a span nor count toward its length.

use std::path::Path;

use ratchet_core::types::Match;

use super::{indent_width, split_lines};
use crate::rules::{Rule, SpanSpec};

/// One match per span whose length exceeds `span.max_lines`, located at
/// the span start.
pub fn evaluate_spans(rule: &Rule, span: &SpanSpec, path: &Path, text: &str) -> Vec<Match> {
    let lines = split_lines(text);
    let mut matches = Vec::new();

    for (start, line) in lines.iter().enumerate() {
        let Some(captures) = rule.pattern().captures(line) else {
            continue;
        };
        let secondary = match span.strategy.derive_secondary(line, &captures) {
            Ok(secondary) => secondary,
            Err(e) => {
                tracing::warn!(
                    rule = rule.name(),
                    path = %path.display(),
                    line = start + 1,
                    error = %e,
                    "could not derive span pattern; candidate skipped"
                );
                continue;
            }
        };

        let length = span_length(&lines, start, |l| secondary.is_match(l));
        if length > span.max_lines {
            matches.push(Match::new(rule.name(), path, start + 1, line));
        }
    }

    matches
}

/// Number of non-blank lines in the span opened at `start`.
pub fn span_length<F>(lines: &[&str], start: usize, is_body: F) -> usize
where
    F: Fn(&str) -> bool,
{
    let Some(signature) = lines.get(start) else {
        return 0;
    };
    let boundary = indent_width(signature);

    let mut length = 0;
    for line in &lines[start + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) <= boundary || !is_body(line) {
            break;
        }
        length += 1;
    }
    length
}
