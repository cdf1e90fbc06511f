//! Side-by-side evaluation of two rules, for tuning a pattern change.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ratchet_core::types::Match;
use serde::{Deserialize, Serialize};

/// Locations keyed by (path, line, text); the rule name is ignored.
type Location = (PathBuf, usize, String);

/// Matches unique to each rule, and those both rules report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDiff {
    pub first: String,
    pub second: String,
    pub only_first: Vec<Match>,
    pub only_second: Vec<Match>,
    /// Shared locations, as reported by the first rule.
    pub common: Vec<Match>,
}

impl RuleDiff {
    pub fn from_matches(
        first: &str,
        second: &str,
        first_matches: Vec<Match>,
        second_matches: Vec<Match>,
    ) -> Self {
        let mut left = by_location(first_matches);
        let right = by_location(second_matches);

        let mut diff = Self {
            first: first.to_string(),
            second: second.to_string(),
            ..Default::default()
        };
        for (location, m) in right {
            match left.remove(&location) {
                Some(shared) => diff.common.push(shared),
                None => diff.only_second.push(m),
            }
        }
        diff.only_first = left.into_values().collect();
        diff.common.sort();
        diff
    }

    pub fn is_identical(&self) -> bool {
        self.only_first.is_empty() && self.only_second.is_empty()
    }
}

fn by_location(matches: Vec<Match>) -> BTreeMap<Location, Match> {
    matches
        .into_iter()
        .map(|m| ((m.path.clone(), m.line, m.text.clone()), m))
        .collect()
}
