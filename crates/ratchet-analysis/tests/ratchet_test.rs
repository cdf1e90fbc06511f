//! End-to-end ratchet operations: check, update, and the history reports,
//! over temporary repositories and the real persistence adapters.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use git2::{Repository, Signature};
use ratchet_analysis::history::{Git2Collaborator, GitCollaborator, Origin};
use ratchet_analysis::ratchet::{
    RatchetEngine, RunOutcome, UpdateDecision, UpdatePolicy, ViolationStore, WOULD_INCREASE,
};
use ratchet_analysis::rules::{builtin, Rule, RuleSet};
use ratchet_analysis::scanner::FileSet;
use ratchet_core::config::RatchetConfig;
use ratchet_core::errors::HistoryError;
use ratchet_core::events::{RatchetEventHandler, RegressionDetectedEvent, UpdateRejectedEvent};
use ratchet_core::traits::{CountsPort, RuleCounts};
use ratchet_core::types::{CommitRecord, FileDiff};
use ratchet_storage::{JsonCountsFile, MemoryCounts, SqliteDiffTier};

#[derive(Default)]
struct EnforcementLog {
    regressions: Mutex<Vec<RegressionDetectedEvent>>,
    rejections: Mutex<Vec<UpdateRejectedEvent>>,
}

impl RatchetEventHandler for EnforcementLog {
    fn on_regression_detected(&self, event: &RegressionDetectedEvent) {
        self.regressions.lock().unwrap().push(event.clone());
    }

    fn on_update_rejected(&self, event: &UpdateRejectedEvent) {
        self.rejections.lock().unwrap().push(event.clone());
    }
}

fn counts(entries: &[(&str, u64)]) -> RuleCounts {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn memory_store(entries: &[(&str, u64)]) -> ViolationStore {
    ViolationStore::open(Box::new(MemoryCounts::with_counts(counts(entries)))).unwrap()
}

fn print_rules() -> RuleSet {
    RuleSet::new(vec![builtin::no_print().unwrap()]).unwrap()
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn prints(n: usize) -> String {
    (1..=n).map(|i| format!("print({i})\n")).collect()
}

/// A repository whose `app.py` gains one print per commit. Returns the
/// commit ids oldest first.
fn print_history(commits: usize) -> (tempfile::TempDir, Vec<String>) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let sig = Signature::now("Dev", "dev@example.com").unwrap();
    let mut ids = Vec::new();
    for n in 1..=commits {
        write(dir.path(), "app.py", &prints(n));
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("app.py")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let id = repo
            .commit(Some("HEAD"), &sig, &sig, &format!("add print {n}"), &tree, &parents)
            .unwrap();
        ids.push(id.to_string());
    }
    (dir, ids)
}

fn budgeted(commit_budget: usize) -> RatchetConfig {
    let mut config = RatchetConfig::default();
    config.history.commit_budget = Some(commit_budget);
    config
}

/// RAT-01: allowed 3, actual 5 fails naming the rule and both counts.
#[test]
fn rat_01_regression_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.py", &prints(5));
    let log = Arc::new(EnforcementLog::default());
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .with_handler(log.clone());

    let report = engine
        .check(&memory_store(&[("no_print", 3)]), &FileSet::WorkingTree, false)
        .unwrap();
    let failures = report.outcome.failures();
    assert_eq!(report.outcome.label(), "fail");
    assert_eq!(failures.len(), 1);
    assert_eq!(
        (failures[0].rule.as_str(), failures[0].allowed, failures[0].actual),
        ("no_print", 3, 5)
    );
    assert_eq!(failures[0].matches.len(), 5);
    assert!(report.summary().contains("no_print: 5 found, 3 allowed (+2)"));
    assert_eq!(log.regressions.lock().unwrap().len(), 1);
}

/// RAT-02: counts at or below the allowed count pass.
#[test]
fn rat_02_within_allowance_passes() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.py", &prints(3));
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules()).unwrap();
    let report = engine
        .check(&memory_store(&[("no_print", 3)]), &FileSet::WorkingTree, true)
        .unwrap();
    assert!(report.outcome.passed());
    assert!(report.attribution.is_none());
}

/// RAT-03: without history, attribution is skipped and the outcome stays
/// a plain failure.
#[test]
fn rat_03_attribution_without_repository() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.py", &prints(2));
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .discover_git();
    let report = engine
        .check(&memory_store(&[]), &FileSet::WorkingTree, true)
        .unwrap();
    assert!(matches!(report.outcome, RunOutcome::Fail { .. }));
    assert!(matches!(
        report.history_error,
        Some(HistoryError::NotARepository { .. })
    ));
    assert!(report.summary().contains("History unavailable"));
}

/// RAT-04: an update below the allowed count is applied; one above is
/// rejected as an increase and leaves the stored value alone.
#[test]
fn rat_04_update_tightens_and_rejects() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let log = Arc::new(EnforcementLog::default());
    let engine = RatchetEngine::new(root, RatchetConfig::default(), print_rules())
        .unwrap()
        .with_handler(log.clone());

    write(root, "app.py", &prints(1));
    let mut store = memory_store(&[("no_print", 3)]);
    let report = engine.update(&mut store, UpdatePolicy::Strict).unwrap();
    assert_eq!(
        report.decisions,
        vec![(
            "no_print".to_string(),
            UpdateDecision::Applied {
                previous: Some(3),
                new: 1
            }
        )]
    );
    assert_eq!(store.allowed("no_print"), 1);

    write(root, "app.py", &prints(5));
    let mut store = memory_store(&[("no_print", 3)]);
    let report = engine.update(&mut store, UpdatePolicy::Strict).unwrap();
    assert!(report.has_rejections());
    match &report.decisions[0].1 {
        UpdateDecision::Rejected {
            allowed,
            proposed,
            reason,
        } => {
            assert_eq!((*allowed, *proposed), (3, 5));
            assert_eq!(reason, WOULD_INCREASE);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(store.allowed("no_print"), 3);
    assert_eq!(log.rejections.lock().unwrap().len(), 1);
}

/// RAT-05: loosening is explicit; removed rules are dropped from the file.
#[test]
fn rat_05_loosening_and_stale_rules_persist() {
    let repo = tempfile::tempdir().unwrap();
    write(repo.path(), "app.py", &prints(4));
    let state = tempfile::tempdir().unwrap();
    let counts_path = state.path().join("ratchet_values.json");
    JsonCountsFile::new(&counts_path)
        .save(&counts(&[("no_print", 2), ("retired_rule", 7)]))
        .unwrap();

    let engine = RatchetEngine::new(repo.path(), RatchetConfig::default(), print_rules()).unwrap();
    let mut store = ViolationStore::open(Box::new(JsonCountsFile::new(&counts_path))).unwrap();
    let report = engine
        .update(&mut store, UpdatePolicy::AllowLoosening)
        .unwrap();
    assert_eq!(
        report.decisions[0].1,
        UpdateDecision::Loosened {
            previous: 2,
            new: 4
        }
    );
    assert_eq!(report.removed, vec!["retired_rule".to_string()]);

    let reopened = ViolationStore::open(Box::new(JsonCountsFile::new(&counts_path))).unwrap();
    assert_eq!(reopened.counts(), &counts(&[("no_print", 4)]));
    let text = fs::read_to_string(&counts_path).unwrap();
    assert!(text.ends_with("}\n"));
}

/// RAT-06: a two-commit budget over three failing matches attributes two
/// and reports a partial failure with one unresolved match.
#[test]
fn rat_06_budget_gives_partial_fail() {
    let (dir, ids) = print_history(3);
    let engine = RatchetEngine::new(dir.path(), budgeted(2), print_rules())
        .unwrap()
        .discover_git();

    let report = engine
        .check(&memory_store(&[("no_print", 0)]), &FileSet::WorkingTree, true)
        .unwrap();
    match &report.outcome {
        RunOutcome::PartialFail {
            failures,
            commits_scanned,
            unresolved,
        } => {
            assert_eq!(failures[0].actual, 3);
            assert_eq!(*commits_scanned, 2);
            assert_eq!(*unresolved, 1);
        }
        other => panic!("expected partial failure, got {other:?}"),
    }

    let attribution = report.attribution.as_ref().unwrap();
    assert_eq!(attribution.attributions.len(), 2);
    assert_eq!(attribution.attributions[0].violation.text, "print(3)");
    assert!(matches!(&attribution.attributions[0].origin, Origin::Commit(c) if c.id == ids[2]));
    assert_eq!(attribution.unresolved[0].text, "print(1)");
    assert!(report.summary().contains("Origin unknown for 1 match(es) after 2 commit(s)"));
}

/// RAT-07: with enough budget every failing match is attributed and the
/// outcome is a plain failure.
#[test]
fn rat_07_full_attribution_fails_cleanly() {
    let (dir, _) = print_history(3);
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .discover_git();
    let report = engine
        .check(&memory_store(&[("no_print", 1)]), &FileSet::WorkingTree, true)
        .unwrap();
    assert!(matches!(report.outcome, RunOutcome::Fail { .. }));
    let attribution = report.attribution.unwrap();
    assert_eq!(attribution.total_attributed, 3);
    assert!(attribution.unresolved.is_empty());
    assert!(!attribution.budget_exhausted);
}

/// RAT-08: diffs fetched by one engine are served from the persistent tier
/// to the next.
#[test]
fn rat_08_persistent_diff_tier() {
    let (dir, _) = print_history(3);
    let tier = Arc::new(SqliteDiffTier::open_in_memory().unwrap());
    let store = memory_store(&[]);

    let first = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .discover_git()
        .with_cache_tier(tier.clone());
    first.check(&store, &FileSet::WorkingTree, true).unwrap();
    assert_eq!(tier.entry_count().unwrap(), 3);

    let second = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .discover_git()
        .with_cache_tier(tier.clone());
    second.check(&store, &FileSet::WorkingTree, true).unwrap();
    assert_eq!(second.cache().stats().persistent_hits, 3);
}

/// RAT-09: with nothing failing, recent violations fall back to every
/// match, newest first, truncated to the limit.
#[test]
fn rat_09_recent_violations_fallback() {
    let (dir, _) = print_history(3);
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .discover_git();
    let report = engine
        .recent_violations(&memory_store(&[("no_print", 10)]), 2)
        .unwrap();
    assert_eq!(report.total_attributed, 3);
    let texts: Vec<_> = report
        .attributions
        .iter()
        .map(|a| a.violation.text.as_str())
        .collect();
    assert_eq!(texts, vec!["print(3)", "print(2)"]);
}

/// RAT-10: files changed since a base are scanned and their matches
/// attributed, uncommitted work first.
#[test]
fn rat_10_inspect_changed() {
    let (dir, ids) = print_history(3);
    write(dir.path(), "new.py", "print('wip')\n");
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .discover_git();

    let touched = engine.inspect_changed(Some(&ids[1])).unwrap();
    assert_eq!(
        touched.files,
        vec![PathBuf::from("app.py"), PathBuf::from("new.py")]
    );
    let attributions = &touched.by_rule["no_print"];
    assert_eq!(attributions.len(), 4);
    assert_eq!(attributions[0].origin, Origin::WorkingTree);
    assert_eq!(attributions[0].violation.path, PathBuf::from("new.py"));
    assert!(touched.unresolved.is_empty());
}

/// RAT-11: two candidate rules are compared over the same files.
#[test]
fn rat_11_compare_rules() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.py", "print(1)\n# print(2)\nlog(3)\n");
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules()).unwrap();

    let broad = Rule::builder("any_print", r"print\(").build().unwrap();
    let strict = builtin::no_print().unwrap();
    let diff = engine
        .compare_rules(&broad, &strict, &FileSet::WorkingTree)
        .unwrap();
    assert_eq!(diff.common.len(), 1);
    assert_eq!(diff.only_first.len(), 1);
    assert_eq!(diff.only_first[0].line, 2);
    assert!(diff.only_second.is_empty());
    assert!(!diff.is_identical());
}

/// RAT-12: an engine rooted in a subdirectory of the repository scans
/// tracked files and attributes matches with root-relative paths.
#[test]
fn rat_12_root_below_work_tree() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    write(dir.path(), "sub/app.py", "print(1)\n");
    write(dir.path(), "top.py", "print(0)\n");
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("sub/app.py")).unwrap();
    index.add_path(Path::new("top.py")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Dev", "dev@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "add app", &tree, &[]).unwrap();

    let root = dir.path().join("sub");
    let engine = RatchetEngine::new(&root, RatchetConfig::default(), print_rules())
        .unwrap()
        .discover_git();

    let tracked = engine.scan(&FileSet::Tracked).unwrap();
    assert!(tracked.warnings.is_empty());
    assert_eq!(tracked.matches_for_rule("no_print").len(), 1);
    assert!(tracked.matches.contains_key(Path::new("app.py")));

    let report = engine
        .recent_violations(&memory_store(&[("no_print", 0)]), 10)
        .unwrap();
    assert_eq!(report.total_attributed, 1);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.attributions[0].violation.path, PathBuf::from("app.py"));
}

/// RAT-13: an edited rule can be compared with the rule it replaces even
/// though both carry the same name.
#[test]
fn rat_13_compare_rules_with_same_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.py", "print(1)\n# print(2)\nlog(3)\n");
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules()).unwrap();

    let current = builtin::no_print().unwrap();
    let edited = Rule::builder("no_print", r"print\(").build().unwrap();
    let diff = engine
        .compare_rules(&current, &edited, &FileSet::WorkingTree)
        .unwrap();
    assert_eq!(diff.first, diff.second);
    assert_eq!(diff.common.len(), 1);
    assert!(diff.only_first.is_empty());
    assert_eq!(diff.only_second.len(), 1);
    assert_eq!(diff.only_second[0].line, 2);
}

/// Delegates to libgit2 and counts changed-file queries.
struct CountingGit {
    inner: Git2Collaborator,
    changed_files_calls: AtomicUsize,
}

impl GitCollaborator for CountingGit {
    fn tracked_files(&self) -> Result<Vec<PathBuf>, HistoryError> {
        self.inner.tracked_files()
    }

    fn changed_files(&self, base_ref: &str) -> Result<Vec<PathBuf>, HistoryError> {
        self.changed_files_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.changed_files(base_ref)
    }

    fn log(&self, from_ref: &str, limit: usize) -> Result<Vec<CommitRecord>, HistoryError> {
        self.inner.log(from_ref, limit)
    }

    fn changed_paths(&self, commit: &str) -> Result<Vec<PathBuf>, HistoryError> {
        self.inner.changed_paths(commit)
    }

    fn file_diff(&self, commit: &str, path: &Path) -> Result<FileDiff, HistoryError> {
        self.inner.file_diff(commit, path)
    }

    fn worktree_diff(&self, path: &Path) -> Result<FileDiff, HistoryError> {
        self.inner.worktree_diff(path)
    }
}

/// RAT-14: the changed-file set is resolved once per report.
#[test]
fn rat_14_inspect_changed_resolves_once() {
    let (dir, ids) = print_history(3);
    write(dir.path(), "new.py", "print('wip')\n");
    let git = Arc::new(CountingGit {
        inner: Git2Collaborator::discover(dir.path()).unwrap(),
        changed_files_calls: AtomicUsize::new(0),
    });
    let engine = RatchetEngine::new(dir.path(), RatchetConfig::default(), print_rules())
        .unwrap()
        .with_git(git.clone());

    let touched = engine.inspect_changed(Some(&ids[1])).unwrap();
    assert_eq!(touched.files.len(), 2);
    assert_eq!(git.changed_files_calls.load(Ordering::SeqCst), 1);
}
