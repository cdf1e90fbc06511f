//! Single-pass evaluation: per line, or over the whole text.

use std::path::Path;

use ratchet_core::types::Match;

use super::split_lines;
use crate::rules::Rule;

/// One match per line on which the pattern matches.
pub fn evaluate_lines(rule: &Rule, path: &Path, text: &str) -> Vec<Match> {
    split_lines(text)
        .into_iter()
        .enumerate()
        .filter(|(_, line)| rule.pattern().is_match(line))
        .map(|(idx, line)| Match::new(rule.name(), path, idx + 1, line))
        .collect()
}

/// Matches of the pattern over the whole text, each located at the line
/// holding its first byte and reported with that full line.
pub fn evaluate_whole_text(rule: &Rule, path: &Path, text: &str) -> Vec<Match> {
    let line_starts = line_starts(text);
    rule.pattern()
        .find_iter(text)
        .map(|m| {
            let idx = match line_starts.binary_search(&m.start()) {
                Ok(idx) => idx,
                Err(idx) => idx - 1,
            };
            let start = line_starts[idx];
            let end = text[start..]
                .find('\n')
                .map(|offset| start + offset)
                .unwrap_or(text.len());
            let line = text[start..end].trim_end_matches('\r');
            Match::new(rule.name(), path, idx + 1, line)
        })
        .collect()
}

/// Byte offsets at which each line begins. Always starts with 0.
fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}
