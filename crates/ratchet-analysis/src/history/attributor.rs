//! Commit attribution for failing matches.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use ratchet_core::constants;
use ratchet_core::errors::HistoryError;
use ratchet_core::events::{AttributionCompleteEvent, CommitVisitedEvent, RatchetEventHandler};
use ratchet_core::traits::Budget;
use ratchet_core::types::{FileDiff, Match};

use super::cache::HistoryCache;
use super::collaborator::GitCollaborator;
use super::types::{Attribution, AttributionReport, Origin};
use super::walk::CommitWalk;

/// Pending matches grouped by file, each list sorted by line.
type Pending = BTreeMap<PathBuf, Vec<Match>>;

/// Finds the change that most recently introduced each failing match.
///
/// The walk is a fold over first-parent history: every visited commit
/// claims the pending matches its added lines explain, and the walk stops
/// once nothing is pending, the budget runs out, or history ends.
pub struct Attributor<'a> {
    git: &'a dyn GitCollaborator,
    cache: &'a HistoryCache,
    events: &'a dyn RatchetEventHandler,
    include_working_tree: bool,
    page_size: usize,
}

impl<'a> Attributor<'a> {
    pub fn new(
        git: &'a dyn GitCollaborator,
        cache: &'a HistoryCache,
        events: &'a dyn RatchetEventHandler,
    ) -> Self {
        Self {
            git,
            cache,
            events,
            include_working_tree: true,
            page_size: constants::LOG_PAGE_SIZE,
        }
    }

    /// Whether uncommitted changes are consulted before the first commit.
    pub fn include_working_tree(mut self, include: bool) -> Self {
        self.include_working_tree = include;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Attribute `pending` walking back from `head_ref`.
    ///
    /// `budget` is charged one unit per commit. The report holds at most
    /// `limit` attributions, newest first.
    pub fn attribute(
        &self,
        head_ref: &str,
        pending: Vec<Match>,
        budget: &Budget,
        limit: usize,
    ) -> Result<AttributionReport, HistoryError> {
        let mut pending = group(pending);
        let mut attributions: Vec<Attribution> = Vec::new();
        let mut report = AttributionReport::default();

        if self.include_working_tree && !pending.is_empty() {
            let diffs = self.worktree_diffs(&pending)?;
            let claimed = claim(&mut pending, &diffs);
            tracing::debug!(claimed = claimed.len(), "working tree attribution");
            attributions.extend(claimed.into_iter().map(|violation| Attribution {
                violation,
                origin: Origin::WorkingTree,
                recency: 0,
            }));
        }

        let mut walk = CommitWalk::new(self.git, head_ref, self.page_size);
        while !pending.is_empty() {
            if !budget.try_acquire() {
                report.budget_exhausted = walk.peek()?.is_some();
                break;
            }
            let Some(commit) = walk.next_commit()? else {
                report.history_exhausted = true;
                break;
            };
            report.commits_scanned += 1;

            let changed = self
                .cache
                .changed_paths_or_fetch(&commit.id, || self.git.changed_paths(&commit.id))?;
            let touched: Vec<&PathBuf> = changed
                .iter()
                .filter(|path| pending.contains_key(*path))
                .collect();

            let diffs: Vec<Arc<FileDiff>> = touched
                .par_iter()
                .map(|path| {
                    self.cache
                        .get_or_fetch(&commit.id, path, || self.git.file_diff(&commit.id, path))
                })
                .collect::<Result<_, _>>()?;

            let claimed = claim(&mut pending, &diffs);
            self.events.on_commit_visited(&CommitVisitedEvent {
                commit: commit.id.clone(),
                index: report.commits_scanned,
                attributed: claimed.len(),
            });
            if !claimed.is_empty() {
                tracing::debug!(
                    commit = commit.short_id(),
                    claimed = claimed.len(),
                    remaining = pending.values().map(Vec::len).sum::<usize>(),
                    "commit attributed"
                );
            }
            let recency = report.commits_scanned;
            attributions.extend(claimed.into_iter().map(|violation| Attribution {
                violation,
                origin: Origin::Commit(commit.clone()),
                recency,
            }));
        }

        attributions.sort_by(|a, b| {
            (a.recency, &a.violation.path, a.violation.line)
                .cmp(&(b.recency, &b.violation.path, b.violation.line))
        });
        report.total_attributed = attributions.len();
        attributions.truncate(limit);
        report.attributions = attributions;
        report.unresolved = pending.into_values().flatten().collect();
        report.unresolved.sort();

        if report.is_partial() {
            tracing::warn!(
                commits_scanned = report.commits_scanned,
                unresolved = report.unresolved.len(),
                "attribution budget exhausted; origin unknown for remaining matches"
            );
        }
        tracing::info!(
            attributed = report.total_attributed,
            unresolved = report.unresolved.len(),
            commits_scanned = report.commits_scanned,
            "attribution complete"
        );
        self.events.on_attribution_complete(&AttributionCompleteEvent {
            attributed: report.total_attributed,
            unresolved: report.unresolved.len(),
            commits_scanned: report.commits_scanned,
            budget_exhausted: report.budget_exhausted,
        });

        Ok(report)
    }

    fn worktree_diffs(&self, pending: &Pending) -> Result<Vec<Arc<FileDiff>>, HistoryError> {
        pending
            .keys()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|path| self.git.worktree_diff(path).map(Arc::new))
            .collect()
    }
}

fn group(matches: Vec<Match>) -> Pending {
    let mut grouped: Pending = BTreeMap::new();
    for m in matches {
        grouped.entry(m.path.clone()).or_default().push(m);
    }
    for list in grouped.values_mut() {
        list.sort();
        list.dedup();
    }
    grouped
}

/// Remove and return the pending matches explained by `diffs`.
///
/// Each added line claims at most one match in its file: the one with equal
/// text nearest to it, the lower line on a tie.
fn claim(pending: &mut Pending, diffs: &[Arc<FileDiff>]) -> Vec<Match> {
    let mut claimed = Vec::new();
    for diff in diffs {
        let Some(candidates) = pending.get_mut(&diff.path) else {
            continue;
        };
        for added in &diff.added {
            let text = added.text.trim_end();
            let nearest = candidates
                .iter()
                .enumerate()
                .filter(|(_, m)| m.text == text)
                .min_by_key(|(_, m)| (m.line.abs_diff(added.line), m.line))
                .map(|(i, _)| i);
            if let Some(i) = nearest {
                claimed.push(candidates.remove(i));
            }
            if candidates.is_empty() {
                break;
            }
        }
        if candidates.is_empty() {
            pending.remove(&diff.path);
        }
    }
    claimed
}
