//! Allowed-count bookkeeping over a persistence port.

use std::collections::BTreeSet;

use ratchet_core::errors::StoreError;
use ratchet_core::traits::{CountsPort, RuleCounts};
use serde::{Deserialize, Serialize};

/// Reason attached to a refused increase.
pub const WOULD_INCREASE: &str = "would increase allowed count";

/// Result of checking one rule against its allowed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum Comparison {
    Pass { allowed: u64, actual: u64 },
    Fail { allowed: u64, actual: u64 },
}

impl Comparison {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }
}

/// Whether an update may raise a recorded count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Increases are reported and not written.
    #[default]
    Strict,
    /// Increases are written and reported as loosenings.
    AllowLoosening,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum UpdateDecision {
    /// Written. `previous` is `None` for a rule seen for the first time.
    Applied { previous: Option<u64>, new: u64 },
    /// An increase written under [`UpdatePolicy::AllowLoosening`].
    Loosened { previous: u64, new: u64 },
    Rejected {
        allowed: u64,
        proposed: u64,
        reason: String,
    },
}

impl UpdateDecision {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Per-rule decisions of one full update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReport {
    pub decisions: Vec<(String, UpdateDecision)>,
    /// Recorded rules no longer in the rule set, dropped from the store.
    pub removed: Vec<String>,
}

impl UpdateReport {
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &UpdateDecision)> {
        self.decisions
            .iter()
            .filter(|(_, d)| d.is_rejected())
            .map(|(rule, d)| (rule.as_str(), d))
    }

    pub fn has_rejections(&self) -> bool {
        self.rejected().next().is_some()
    }
}

/// The single writer of the allowed-count map.
///
/// Reads take `&self`; anything that changes the map takes `&mut self`, so
/// one handle can never race itself.
pub struct ViolationStore {
    port: Box<dyn CountsPort>,
    allowed: RuleCounts,
}

impl ViolationStore {
    /// Load the current counts through `port`.
    pub fn open(port: Box<dyn CountsPort>) -> Result<Self, StoreError> {
        let allowed = port.load()?;
        tracing::debug!(location = %port.location(), rules = allowed.len(), "counts loaded");
        Ok(Self { port, allowed })
    }

    pub fn location(&self) -> String {
        self.port.location()
    }

    /// Allowed count for `rule`; 0 when never recorded.
    pub fn allowed(&self, rule: &str) -> u64 {
        self.allowed.get(rule).copied().unwrap_or(0)
    }

    pub fn is_recorded(&self, rule: &str) -> bool {
        self.allowed.contains_key(rule)
    }

    pub fn counts(&self) -> &RuleCounts {
        &self.allowed
    }

    pub fn compare(&self, rule: &str, actual: u64) -> Comparison {
        let allowed = self.allowed(rule);
        if actual > allowed {
            Comparison::Fail { allowed, actual }
        } else {
            Comparison::Pass { allowed, actual }
        }
    }

    /// Record `new` for one rule in memory. Nothing is persisted until
    /// [`Self::save`] or [`Self::update_all`].
    pub fn update(&mut self, rule: &str, new: u64, policy: UpdatePolicy) -> UpdateDecision {
        let decision = match self.allowed.get(rule).copied() {
            None => UpdateDecision::Applied {
                previous: None,
                new,
            },
            Some(previous) if new <= previous => UpdateDecision::Applied {
                previous: Some(previous),
                new,
            },
            Some(previous) => match policy {
                UpdatePolicy::Strict => UpdateDecision::Rejected {
                    allowed: previous,
                    proposed: new,
                    reason: WOULD_INCREASE.to_string(),
                },
                UpdatePolicy::AllowLoosening => UpdateDecision::Loosened { previous, new },
            },
        };
        if !decision.is_rejected() {
            self.allowed.insert(rule.to_string(), new);
        }
        decision
    }

    /// Apply `actual` for every rule, drop recorded rules missing from
    /// `actual`, and persist.
    pub fn update_all(
        &mut self,
        actual: &RuleCounts,
        policy: UpdatePolicy,
    ) -> Result<UpdateReport, StoreError> {
        let mut report = UpdateReport::default();
        for (rule, &count) in actual {
            let decision = self.update(rule, count, policy);
            match &decision {
                UpdateDecision::Rejected {
                    allowed, proposed, ..
                } => tracing::warn!(rule, allowed, proposed, "update rejected: {WOULD_INCREASE}"),
                UpdateDecision::Loosened { previous, new } => {
                    tracing::warn!(rule, previous, new, "allowed count loosened")
                }
                UpdateDecision::Applied { .. } => {}
            }
            report.decisions.push((rule.clone(), decision));
        }

        let live: BTreeSet<&String> = actual.keys().collect();
        let stale: Vec<String> = self
            .allowed
            .keys()
            .filter(|rule| !live.contains(rule))
            .cloned()
            .collect();
        for rule in &stale {
            self.allowed.remove(rule);
            tracing::info!(rule = %rule, "dropped count for removed rule");
        }
        report.removed = stale;

        self.save()?;
        Ok(report)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.port.save(&self.allowed)?;
        tracing::debug!(location = %self.port.location(), rules = self.allowed.len(), "counts saved");
        Ok(())
    }
}

impl std::fmt::Debug for ViolationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViolationStore")
            .field("location", &self.port.location())
            .field("allowed", &self.allowed)
            .finish()
    }
}
