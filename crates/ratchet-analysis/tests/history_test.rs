//! History attribution tests against an in-memory git collaborator.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ratchet_analysis::history::{
    Attributor, CommitWalk, GitCollaborator, HistoryCache, Origin,
};
use ratchet_core::errors::HistoryError;
use ratchet_core::events::{CommitVisitedEvent, NoOpHandler, RatchetEventHandler};
use ratchet_core::traits::Budget;
use ratchet_core::types::collections::ParentIds;
use ratchet_core::types::{AddedLine, CommitRecord, FileDiff, Match};

/// Linear history, newest first.
#[derive(Default)]
struct FakeGit {
    commits: Vec<(CommitRecord, Vec<FileDiff>)>,
    worktree: BTreeMap<PathBuf, FileDiff>,
    log_calls: AtomicUsize,
    diff_calls: AtomicUsize,
}

impl FakeGit {
    /// `history` is oldest first; each entry is (path, [(line, text)]).
    fn linear(history: &[&[(&str, &[(usize, &str)])]]) -> Self {
        let ids: Vec<String> = (0..history.len()).map(|i| format!("c{i}")).collect();
        let mut commits = Vec::new();
        for (i, files) in history.iter().enumerate() {
            let parents: ParentIds = if i == 0 {
                ParentIds::new()
            } else {
                std::iter::once(ids[i - 1].clone()).collect()
            };
            let record = CommitRecord {
                id: ids[i].clone(),
                parents,
                timestamp: 1_700_000_000 + i as i64,
                author: "dev".to_string(),
                summary: format!("commit {i}"),
            };
            let diffs: Vec<FileDiff> = files
                .iter()
                .map(|(path, lines)| diff(path, lines))
                .collect();
            commits.push((record, diffs));
        }
        commits.reverse();
        Self {
            commits,
            ..Default::default()
        }
    }

    fn with_worktree(mut self, path: &str, lines: &[(usize, &str)]) -> Self {
        self.worktree.insert(PathBuf::from(path), diff(path, lines));
        self
    }

    fn position(&self, reference: &str) -> Option<usize> {
        if reference == "HEAD" {
            return (!self.commits.is_empty()).then_some(0);
        }
        self.commits.iter().position(|(c, _)| c.id == reference)
    }

    fn commit(&self, id: &str) -> Result<&(CommitRecord, Vec<FileDiff>), HistoryError> {
        self.commits
            .iter()
            .find(|(c, _)| c.id == id)
            .ok_or_else(|| HistoryError::ReferenceNotFound {
                reference: id.to_string(),
            })
    }
}

fn diff(path: &str, lines: &[(usize, &str)]) -> FileDiff {
    FileDiff::new(
        path,
        lines
            .iter()
            .map(|(line, text)| AddedLine {
                line: *line,
                text: text.to_string(),
            })
            .collect(),
    )
}

impl GitCollaborator for FakeGit {
    fn tracked_files(&self) -> Result<Vec<PathBuf>, HistoryError> {
        Ok(Vec::new())
    }

    fn changed_files(&self, _base_ref: &str) -> Result<Vec<PathBuf>, HistoryError> {
        Ok(self.worktree.keys().cloned().collect())
    }

    fn log(&self, from_ref: &str, limit: usize) -> Result<Vec<CommitRecord>, HistoryError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        let start = self
            .position(from_ref)
            .ok_or_else(|| HistoryError::ReferenceNotFound {
                reference: from_ref.to_string(),
            })?;
        Ok(self.commits[start..]
            .iter()
            .take(limit)
            .map(|(c, _)| c.clone())
            .collect())
    }

    fn changed_paths(&self, commit: &str) -> Result<Vec<PathBuf>, HistoryError> {
        Ok(self.commit(commit)?.1.iter().map(|d| d.path.clone()).collect())
    }

    fn file_diff(&self, commit: &str, path: &Path) -> Result<FileDiff, HistoryError> {
        self.diff_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .commit(commit)?
            .1
            .iter()
            .find(|d| d.path == path)
            .cloned()
            .unwrap_or_else(|| FileDiff::new(path, Vec::new())))
    }

    fn worktree_diff(&self, path: &Path) -> Result<FileDiff, HistoryError> {
        Ok(self
            .worktree
            .get(path)
            .cloned()
            .unwrap_or_else(|| FileDiff::new(path, Vec::new())))
    }
}

#[derive(Default)]
struct VisitLog(Mutex<Vec<CommitVisitedEvent>>);

impl RatchetEventHandler for VisitLog {
    fn on_commit_visited(&self, event: &CommitVisitedEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

fn three_commit_history() -> FakeGit {
    FakeGit::linear(&[
        &[("a.py", &[(1, "print('one')")])],
        &[("b.py", &[(1, "print('two')")])],
        &[("a.py", &[(5, "print('three')")])],
    ])
}

fn pending() -> Vec<Match> {
    vec![
        Match::new("no_print", "a.py", 1, "print('one')"),
        Match::new("no_print", "b.py", 1, "print('two')"),
        Match::new("no_print", "a.py", 5, "print('three')"),
    ]
}

/// HIS-01: an unbounded walk attributes each match to its introducing
/// commit, newest first.
#[test]
fn his_01_full_attribution() {
    let git = three_commit_history();
    let cache = HistoryCache::new(64);
    let report = Attributor::new(&git, &cache, &NoOpHandler)
        .attribute("HEAD", pending(), &Budget::unbounded(), 10)
        .unwrap();

    let order: Vec<_> = report
        .attributions
        .iter()
        .map(|a| (a.violation.text.clone(), a.recency))
        .collect();
    assert_eq!(
        order,
        vec![
            ("print('three')".to_string(), 1),
            ("print('two')".to_string(), 2),
            ("print('one')".to_string(), 3),
        ]
    );
    assert!(report.unresolved.is_empty());
    assert!(!report.is_partial());
    assert_eq!(report.commits_scanned, 3);
}

/// HIS-02: a two-commit budget over three pending matches yields two
/// attributions and a partial report with one unresolved match.
#[test]
fn his_02_budget_limits_attribution() {
    let git = three_commit_history();
    let cache = HistoryCache::new(64);
    let report = Attributor::new(&git, &cache, &NoOpHandler)
        .attribute("HEAD", pending(), &Budget::with_units(2), 10)
        .unwrap();

    assert_eq!(report.attributions.len(), 2);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].text, "print('one')");
    assert_eq!(report.commits_scanned, 2);
    assert!(report.budget_exhausted);
    assert!(report.is_partial());
}

/// HIS-03: matches older than all history stay unresolved without a
/// partial flag once history is exhausted.
#[test]
fn his_03_preexisting_matches_unresolved() {
    let git = three_commit_history();
    let cache = HistoryCache::new(64);
    let mut matches = pending();
    matches.push(Match::new("no_print", "c.py", 3, "print('ancient')"));
    let report = Attributor::new(&git, &cache, &NoOpHandler)
        .attribute("HEAD", matches, &Budget::unbounded(), 10)
        .unwrap();

    assert_eq!(report.unresolved.len(), 1);
    assert!(report.history_exhausted);
    assert!(!report.budget_exhausted);
    assert!(!report.is_partial());
}

/// HIS-04: uncommitted lines are attributed to the working tree and sort
/// before every commit.
#[test]
fn his_04_working_tree_first() {
    let git = three_commit_history().with_worktree("d.py", &[(2, "print('wip')")]);
    let cache = HistoryCache::new(64);
    let mut matches = pending();
    matches.push(Match::new("no_print", "d.py", 2, "print('wip')"));

    let report = Attributor::new(&git, &cache, &NoOpHandler)
        .attribute("HEAD", matches.clone(), &Budget::unbounded(), 10)
        .unwrap();
    assert_eq!(report.attributions[0].origin, Origin::WorkingTree);
    assert_eq!(report.attributions[0].recency, 0);

    let report = Attributor::new(&git, &cache, &NoOpHandler)
        .include_working_tree(false)
        .attribute("HEAD", matches, &Budget::unbounded(), 10)
        .unwrap();
    assert_eq!(report.unresolved.len(), 1);
}

/// HIS-05: the limit truncates the newest-first list but not the total.
#[test]
fn his_05_limit_truncates() {
    let git = three_commit_history();
    let cache = HistoryCache::new(64);
    let report = Attributor::new(&git, &cache, &NoOpHandler)
        .attribute("HEAD", pending(), &Budget::unbounded(), 1)
        .unwrap();
    assert_eq!(report.attributions.len(), 1);
    assert_eq!(report.total_attributed, 3);
    assert_eq!(report.attributions[0].violation.text, "print('three')");
}

/// HIS-06: the walk stops as soon as nothing is pending.
#[test]
fn his_06_stops_when_resolved() {
    let git = three_commit_history();
    let cache = HistoryCache::new(64);
    let visits = VisitLog::default();
    let only_newest = vec![Match::new("no_print", "a.py", 5, "print('three')")];
    let report = Attributor::new(&git, &cache, &visits)
        .attribute("HEAD", only_newest, &Budget::unbounded(), 10)
        .unwrap();
    assert_eq!(report.commits_scanned, 1);
    assert!(!report.history_exhausted);

    let visits = visits.0.lock().unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].commit, "c2");
    assert_eq!(visits[0].attributed, 1);
}

/// HIS-07: repeated attribution over the same commits reuses cached diffs.
#[test]
fn his_07_cache_reused_across_runs() {
    let git = three_commit_history();
    let cache = HistoryCache::new(64);
    for _ in 0..2 {
        Attributor::new(&git, &cache, &NoOpHandler)
            .attribute("HEAD", pending(), &Budget::unbounded(), 10)
            .unwrap();
    }
    assert_eq!(git.diff_calls.load(Ordering::SeqCst), 3);
    assert!(cache.hit_rate() > 0.0);
}

/// HIS-08: the commit walk pages through history without re-walking and
/// can restart.
#[test]
fn his_08_commit_walk_pages() {
    let history: Vec<Vec<(&str, &[(usize, &str)])>> = (0..5).map(|_| Vec::new()).collect();
    let refs: Vec<&[(&str, &[(usize, &str)])]> = history.iter().map(Vec::as_slice).collect();
    let git = FakeGit::linear(&refs);

    let mut walk = CommitWalk::new(&git, "HEAD", 2);
    let ids: Vec<String> = walk.by_ref().map(|c| c.unwrap().id).collect();
    assert_eq!(ids, vec!["c4", "c3", "c2", "c1", "c0"]);
    assert_eq!(walk.yielded(), 5);
    assert_eq!(git.log_calls.load(Ordering::SeqCst), 3);

    walk.restart("c1");
    assert_eq!(walk.next_commit().unwrap().unwrap().id, "c1");
    assert_eq!(walk.peek().unwrap().unwrap().id, "c0");
}

/// HIS-09: an unknown starting reference is an error, not an empty report.
#[test]
fn his_09_unknown_reference() {
    let git = three_commit_history();
    let cache = HistoryCache::new(64);
    let err = Attributor::new(&git, &cache, &NoOpHandler)
        .include_working_tree(false)
        .attribute("missing", pending(), &Budget::unbounded(), 10)
        .unwrap_err();
    assert!(matches!(err, HistoryError::ReferenceNotFound { .. }));
}
