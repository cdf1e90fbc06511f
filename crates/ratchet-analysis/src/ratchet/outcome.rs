//! Run outcomes and the report around them.

use std::fmt::Write as _;

use ratchet_core::errors::HistoryError;
use ratchet_core::types::Match;
use serde::{Deserialize, Serialize};

use crate::history::AttributionReport;
use crate::scanner::ScanWarning;

/// A rule whose actual count exceeds its allowed count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub rule: String,
    pub allowed: u64,
    pub actual: u64,
    /// Every current match of the rule, in path then line order.
    pub matches: Vec<Match>,
}

impl RuleFailure {
    pub fn excess(&self) -> u64 {
        self.actual.saturating_sub(self.allowed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum RunOutcome {
    Pass,
    Fail { failures: Vec<RuleFailure> },
    /// Failures whose attribution ran out of budget with history left.
    PartialFail {
        failures: Vec<RuleFailure>,
        commits_scanned: usize,
        unresolved: usize,
    },
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn failures(&self) -> &[RuleFailure] {
        match self {
            Self::Pass => &[],
            Self::Fail { failures } | Self::PartialFail { failures, .. } => failures,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail { .. } => "fail",
            Self::PartialFail { .. } => "partial_fail",
        }
    }
}

/// Everything one `check` produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub warnings: Vec<ScanWarning>,
    /// The scan budget stopped before every file ran.
    pub scan_partial: bool,
    pub attribution: Option<AttributionReport>,
    /// Attribution could not run; the outcome still stands.
    #[serde(skip)]
    pub history_error: Option<HistoryError>,
}

impl RunReport {
    /// Multi-line human summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        match &self.outcome {
            RunOutcome::Pass => out.push_str("All ratchets pass.\n"),
            RunOutcome::Fail { failures } | RunOutcome::PartialFail { failures, .. } => {
                let _ = writeln!(out, "{} ratchet(s) broken:", failures.len());
                for failure in failures {
                    let _ = writeln!(
                        out,
                        "  {}: {} found, {} allowed (+{})",
                        failure.rule,
                        failure.actual,
                        failure.allowed,
                        failure.excess()
                    );
                }
            }
        }

        if let Some(attribution) = &self.attribution {
            for a in &attribution.attributions {
                let _ = writeln!(out, "  {}  <- {}", a.violation, a.origin.label());
            }
        }
        if let RunOutcome::PartialFail {
            commits_scanned,
            unresolved,
            ..
        } = &self.outcome
        {
            let _ = writeln!(
                out,
                "Origin unknown for {unresolved} match(es) after {commits_scanned} commit(s); raise the commit budget to search further."
            );
        }
        if let Some(error) = &self.history_error {
            let _ = writeln!(out, "History unavailable: {error}");
        }
        if self.scan_partial {
            out.push_str("Scan budget exhausted; counts cover a partial file set.\n");
        }
        if !self.warnings.is_empty() {
            let _ = writeln!(out, "{} file(s) skipped.", self.warnings.len());
        }
        out
    }
}
