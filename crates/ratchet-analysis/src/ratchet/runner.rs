//! Top-level ratchet operations: check, update, and the history reports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ratchet_core::config::RatchetConfig;
use ratchet_core::errors::{HistoryError, RatchetError};
use ratchet_core::events::{
    EventDispatcher, LooseningAppliedEvent, RatchetEventHandler, RegressionDetectedEvent,
    UpdateRejectedEvent,
};
use ratchet_core::traits::{Budget, DiffTier};
use ratchet_core::types::Match;

use super::compare::RuleDiff;
use super::outcome::{RuleFailure, RunOutcome, RunReport};
use super::store::{Comparison, UpdateDecision, UpdatePolicy, UpdateReport, ViolationStore};
use crate::exclusion::ExclusionScopes;
use crate::history::{
    Attribution, AttributionReport, Attributor, Git2Collaborator, GitCollaborator, HistoryCache,
};
use crate::rules::{Rule, RuleSet};
use crate::scanner::{FileSet, ScanReport, Scanner};

/// Matches in files changed since a base reference, attributed and grouped
/// by rule.
#[derive(Debug, Clone, Default)]
pub struct TouchedReport {
    pub files: Vec<PathBuf>,
    /// Newest first within each rule.
    pub by_rule: BTreeMap<String, Vec<Attribution>>,
    pub unresolved: Vec<Match>,
    pub budget_exhausted: bool,
}

/// Owns the configured pieces of one repository's ratchet and runs the
/// operations over them.
pub struct RatchetEngine {
    root: PathBuf,
    config: RatchetConfig,
    rules: RuleSet,
    scopes: ExclusionScopes,
    scanner: Scanner,
    git: Option<Arc<dyn GitCollaborator>>,
    cache: HistoryCache,
    events: EventDispatcher,
}

impl RatchetEngine {
    /// Exclusion scopes are discovered under `root`. No git collaborator is
    /// attached; see [`Self::with_git`] and [`Self::discover_git`].
    pub fn new(root: &Path, config: RatchetConfig, rules: RuleSet) -> Result<Self, RatchetError> {
        let scopes = ExclusionScopes::discover(
            root,
            config.scan.effective_ignore_file_name(),
            &config.scan.extra_exclude,
        )?;
        tracing::debug!(
            root = %root.display(),
            rules = rules.len(),
            scopes = scopes.scope_count(),
            "ratchet engine ready"
        );
        Ok(Self {
            root: root.to_path_buf(),
            scanner: Scanner::new(config.scan.clone()),
            cache: HistoryCache::from_config(&config.cache),
            config,
            rules,
            scopes,
            git: None,
            events: EventDispatcher::new(),
        })
    }

    pub fn with_git(mut self, git: Arc<dyn GitCollaborator>) -> Self {
        self.git = Some(git);
        self
    }

    /// Attach a libgit2 collaborator when `root` is inside a repository.
    pub fn discover_git(mut self) -> Self {
        match Git2Collaborator::discover(&self.root) {
            Ok(git) => self.git = Some(Arc::new(git)),
            Err(e) => tracing::info!(error = %e, "history unavailable; attribution disabled"),
        }
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn RatchetEventHandler>) -> Self {
        self.events.register(handler);
        self
    }

    pub fn with_scopes(mut self, scopes: ExclusionScopes) -> Self {
        self.scopes = scopes;
        self
    }

    /// Back the history cache with a persistent tier.
    pub fn with_cache_tier(mut self, tier: Arc<dyn DiffTier>) -> Self {
        self.cache = HistoryCache::from_config(&self.config.cache).with_persistent(tier);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RatchetConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    fn scan_budget(&self) -> Budget {
        Budget::from_limits(self.config.scan.max_files, self.config.scan.deadline())
    }

    fn history_budget(&self) -> Budget {
        Budget::from_limits(
            Some(self.config.history.effective_commit_budget()),
            self.config.history.deadline(),
        )
    }

    fn git(&self) -> Result<&dyn GitCollaborator, HistoryError> {
        self.git
            .as_deref()
            .ok_or_else(|| HistoryError::NotARepository {
                path: self.root.display().to_string(),
            })
    }

    fn attributor(&self) -> Result<Attributor<'_>, HistoryError> {
        Ok(Attributor::new(self.git()?, &self.cache, &self.events)
            .include_working_tree(self.config.history.effective_include_working_tree()))
    }

    /// Evaluate every rule over `files` within the configured scan budget.
    pub fn scan(&self, files: &FileSet) -> Result<ScanReport, RatchetError> {
        self.scan_with(&self.rules, files, &self.scan_budget())
    }

    fn scan_with(
        &self,
        rules: &RuleSet,
        files: &FileSet,
        budget: &Budget,
    ) -> Result<ScanReport, RatchetError> {
        self.scanner.scan_file_set(
            &self.root,
            files,
            rules,
            &self.scopes,
            budget,
            &self.events,
            self.git.as_deref(),
        )
    }

    /// Compare current counts with the allowed counts.
    ///
    /// With `attribute`, failing matches are traced through history. A
    /// history failure is logged and leaves the outcome at `Fail`.
    pub fn check(
        &self,
        store: &ViolationStore,
        files: &FileSet,
        attribute: bool,
    ) -> Result<RunReport, RatchetError> {
        let scan = self.scan(files)?;
        let counts = scan.counts_by_rule(&self.rules);

        let mut failures = Vec::new();
        for rule in &self.rules {
            let actual = counts.get(rule.name()).copied().unwrap_or(0);
            if let Comparison::Fail { allowed, actual } = store.compare(rule.name(), actual) {
                tracing::warn!(rule = rule.name(), allowed, actual, "ratchet broken");
                self.events.on_regression_detected(&RegressionDetectedEvent {
                    rule: rule.name().to_string(),
                    allowed,
                    actual,
                });
                failures.push(RuleFailure {
                    rule: rule.name().to_string(),
                    allowed,
                    actual,
                    matches: scan.matches_for_rule(rule.name()),
                });
            }
        }

        let mut report = RunReport {
            outcome: RunOutcome::Pass,
            warnings: scan.warnings,
            scan_partial: scan.partial,
            attribution: None,
            history_error: None,
        };
        if failures.is_empty() {
            return Ok(report);
        }
        if !attribute {
            report.outcome = RunOutcome::Fail { failures };
            return Ok(report);
        }

        let pending: Vec<Match> = failures.iter().flat_map(|f| f.matches.clone()).collect();
        match self.attribute(pending) {
            Ok(attribution) => {
                report.outcome = if attribution.is_partial() {
                    RunOutcome::PartialFail {
                        failures,
                        commits_scanned: attribution.commits_scanned,
                        unresolved: attribution.unresolved.len(),
                    }
                } else {
                    RunOutcome::Fail { failures }
                };
                report.attribution = Some(attribution);
            }
            Err(e) => {
                tracing::warn!(error = %e, "attribution skipped");
                report.outcome = RunOutcome::Fail { failures };
                report.history_error = Some(e);
            }
        }
        Ok(report)
    }

    fn attribute(&self, pending: Vec<Match>) -> Result<AttributionReport, HistoryError> {
        self.attributor()?.attribute(
            self.config.history.effective_head_ref(),
            pending,
            &self.history_budget(),
            self.config.history.effective_attribution_limit(),
        )
    }

    /// Recount every rule over the whole working tree and record the result.
    ///
    /// Runs without the scan budget: counts from a partial scan would
    /// silently tighten the ratchet.
    pub fn update(
        &self,
        store: &mut ViolationStore,
        policy: UpdatePolicy,
    ) -> Result<UpdateReport, RatchetError> {
        let scan = self.scan_with(&self.rules, &FileSet::WorkingTree, &Budget::unbounded())?;
        let counts = scan.counts_by_rule(&self.rules);
        let report = store.update_all(&counts, policy)?;

        for (rule, decision) in &report.decisions {
            match decision {
                UpdateDecision::Rejected {
                    allowed, proposed, ..
                } => self.events.on_update_rejected(&UpdateRejectedEvent {
                    rule: rule.clone(),
                    allowed: *allowed,
                    proposed: *proposed,
                }),
                UpdateDecision::Loosened { previous, new } => {
                    self.events.on_loosening_applied(&LooseningAppliedEvent {
                        rule: rule.clone(),
                        previous: *previous,
                        new: *new,
                    })
                }
                UpdateDecision::Applied { .. } => {}
            }
        }
        tracing::info!(
            rules = report.decisions.len(),
            removed = report.removed.len(),
            location = %store.location(),
            "counts updated"
        );
        Ok(report)
    }

    /// The most recently introduced failing matches, newest first.
    ///
    /// When no rule fails, every current match is attributed instead.
    pub fn recent_violations(
        &self,
        store: &ViolationStore,
        limit: usize,
    ) -> Result<AttributionReport, RatchetError> {
        let scan = self.scan(&FileSet::WorkingTree)?;
        let counts = scan.counts_by_rule(&self.rules);

        let mut pending: Vec<Match> = self
            .rules
            .iter()
            .filter(|rule| {
                let actual = counts.get(rule.name()).copied().unwrap_or(0);
                !store.compare(rule.name(), actual).passed()
            })
            .flat_map(|rule| scan.matches_for_rule(rule.name()))
            .collect();
        if pending.is_empty() {
            tracing::info!("no ratchet is broken; attributing every match");
            pending = scan.all_matches().cloned().collect();
        }

        Ok(self.attributor()?.attribute(
            self.config.history.effective_head_ref(),
            pending,
            &self.history_budget(),
            limit,
        )?)
    }

    /// Matches in files changed since `base_ref` (default: the configured
    /// base), per rule, newest first.
    pub fn inspect_changed(&self, base_ref: Option<&str>) -> Result<TouchedReport, RatchetError> {
        let base = base_ref.unwrap_or(self.config.history.effective_base_ref());
        let files = self.git()?.changed_files(base)?;
        let scan = self.scan(&FileSet::Explicit(files.clone()))?;
        let pending: Vec<Match> = scan.all_matches().cloned().collect();

        let attribution = self.attributor()?.attribute(
            self.config.history.effective_head_ref(),
            pending,
            &self.history_budget(),
            usize::MAX,
        )?;

        let mut by_rule: BTreeMap<String, Vec<Attribution>> = BTreeMap::new();
        for a in attribution.attributions {
            by_rule.entry(a.violation.rule.clone()).or_default().push(a);
        }
        Ok(TouchedReport {
            files,
            by_rule,
            unresolved: attribution.unresolved,
            budget_exhausted: attribution.budget_exhausted,
        })
    }

    /// Evaluate two rules over the same files and split their matches.
    ///
    /// The rules are scanned separately, so an edited rule may keep the
    /// name of the one it replaces.
    pub fn compare_rules(
        &self,
        first: &Rule,
        second: &Rule,
        files: &FileSet,
    ) -> Result<RuleDiff, RatchetError> {
        let resolved =
            FileSet::Explicit(files.resolve(&self.root, &self.scopes, self.git.as_deref())?);
        let scan_one = |rule: &Rule| -> Result<ScanReport, RatchetError> {
            let single = RuleSet::new(vec![rule.clone()])?;
            self.scan_with(&single, &resolved, &self.scan_budget())
        };
        let first_scan = scan_one(first)?;
        let second_scan = scan_one(second)?;
        Ok(RuleDiff::from_matches(
            first.name(),
            second.name(),
            first_scan.matches_for_rule(first.name()),
            second_scan.matches_for_rule(second.name()),
        ))
    }
}

impl std::fmt::Debug for RatchetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatchetEngine")
            .field("root", &self.root)
            .field("rules", &self.rules.len())
            .field("git", &self.git.is_some())
            .finish()
    }
}
