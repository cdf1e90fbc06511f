//! Parallel rule evaluation over a file set.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use ratchet_core::config::ScanConfig;
use ratchet_core::constants;
use ratchet_core::errors::{RatchetError, ScanError};
use ratchet_core::events::{
    FileSkippedEvent, RatchetEventHandler, ScanCompleteEvent, ScanStartedEvent,
};
use ratchet_core::traits::Budget;
use ratchet_core::types::Match;

use super::file_set::FileSet;
use super::types::{ScanReport, ScanStats, ScanWarning};
use crate::engine;
use crate::exclusion::ExclusionScopes;
use crate::history::GitCollaborator;
use crate::rules::RuleSet;

/// Evaluates a rule set over files on a bounded worker pool.
pub struct Scanner {
    config: ScanConfig,
    pool: Option<rayon::ThreadPool>,
}

enum FileOutcome {
    Scanned { path: PathBuf, size: u64, matches: Vec<Match> },
    Skipped { path: PathBuf, error: ScanError },
    NotDispatched,
}

impl Scanner {
    /// A dedicated pool is built when `threads` is set; otherwise the
    /// global rayon pool is used.
    pub fn new(config: ScanConfig) -> Self {
        let pool = match config.effective_threads() {
            0 => None,
            threads => match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("ratchet-scan-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!(error = %e, threads, "scan pool unavailable; using global pool");
                    None
                }
            },
        };
        Self { config, pool }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Resolve `file_set` and scan it.
    pub fn scan_file_set(
        &self,
        root: &Path,
        file_set: &FileSet,
        rules: &RuleSet,
        scopes: &ExclusionScopes,
        budget: &Budget,
        events: &dyn RatchetEventHandler,
        git: Option<&dyn GitCollaborator>,
    ) -> Result<ScanReport, RatchetError> {
        let files = file_set.resolve(root, scopes, git)?;
        Ok(self.scan(root, &files, rules, scopes, budget, events))
    }

    /// Scan root-relative `files`.
    ///
    /// Excluded files and files no rule applies to are dropped first. The
    /// rest run in parallel; each worker claims a budget unit before
    /// reading its file. Output order does not depend on scheduling.
    pub fn scan(
        &self,
        root: &Path,
        files: &[PathBuf],
        rules: &RuleSet,
        scopes: &ExclusionScopes,
        budget: &Budget,
        events: &dyn RatchetEventHandler,
    ) -> ScanReport {
        let start = Instant::now();

        let mut excluded = 0usize;
        let mut candidates: Vec<&PathBuf> = Vec::with_capacity(files.len());
        for path in files {
            if scopes.is_excluded(path, false) {
                excluded += 1;
            } else if rules.iter().any(|r| r.applies_to(path)) {
                candidates.push(path);
            }
        }
        candidates.sort();

        events.on_scan_started(&ScanStartedEvent {
            root: root.to_path_buf(),
            file_count: candidates.len(),
            rule_count: rules.len(),
        });

        let work = || -> Vec<FileOutcome> {
            candidates
                .par_iter()
                .map(|path| {
                    if !budget.try_acquire() {
                        return FileOutcome::NotDispatched;
                    }
                    match self.process_file(root, path, rules) {
                        Ok((size, matches)) => FileOutcome::Scanned {
                            path: (*path).clone(),
                            size,
                            matches,
                        },
                        Err(error) => {
                            events.on_file_skipped(&FileSkippedEvent {
                                path: (*path).clone(),
                                reason: error.to_string(),
                            });
                            FileOutcome::Skipped {
                                path: (*path).clone(),
                                error,
                            }
                        }
                    }
                })
                .collect()
        };
        let outcomes = match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        let mut report = ScanReport {
            stats: ScanStats {
                files_considered: candidates.len(),
                files_excluded: excluded,
                ..Default::default()
            },
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome {
                FileOutcome::Scanned {
                    path,
                    size,
                    mut matches,
                } => {
                    report.stats.files_scanned += 1;
                    report.stats.total_size_bytes += size;
                    if !matches.is_empty() {
                        matches.sort();
                        matches.dedup();
                        report.matches.insert(path, matches);
                    }
                }
                FileOutcome::Skipped { path, error } => {
                    match error {
                        ScanError::MaxFileSizeExceeded { .. } => {
                            report.stats.files_skipped_large += 1
                        }
                        ScanError::BinaryFile { .. } => report.stats.files_skipped_binary += 1,
                        _ => report.stats.files_skipped_unreadable += 1,
                    }
                    tracing::debug!(path = %path.display(), error = %error, "file skipped");
                    report.warnings.push(ScanWarning::from_error(path, &error));
                }
                FileOutcome::NotDispatched => report.stats.files_not_dispatched += 1,
            }
        }
        report.warnings.sort();
        report.partial = report.stats.files_not_dispatched > 0 || budget.is_exhausted();
        report.stats.duration_ms = start.elapsed().as_millis() as u64;

        if report.partial {
            tracing::warn!(
                not_dispatched = report.stats.files_not_dispatched,
                "scan budget exhausted; results are partial"
            );
        }
        tracing::info!(
            files = report.stats.files_scanned,
            matches = report.total_matches(),
            warnings = report.warnings.len(),
            duration_ms = report.stats.duration_ms,
            "scan complete"
        );
        events.on_scan_complete(&ScanCompleteEvent {
            files_scanned: report.stats.files_scanned,
            matches: report.total_matches(),
            partial: report.partial,
            duration_ms: report.stats.duration_ms,
        });

        report
    }

    /// Read one file and evaluate every rule whose filters admit it.
    fn process_file(
        &self,
        root: &Path,
        relative: &Path,
        rules: &RuleSet,
    ) -> Result<(u64, Vec<Match>), ScanError> {
        let full = root.join(relative);
        let io_error = |source: std::io::Error| ScanError::IoError {
            path: relative.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(&full).map_err(io_error)?;
        let size = metadata.len();
        let max = self.config.effective_max_file_size();
        if size > max {
            return Err(ScanError::MaxFileSizeExceeded {
                path: relative.to_path_buf(),
                size,
                max,
            });
        }

        let mut bytes = Vec::with_capacity(size as usize);
        fs::File::open(&full)
            .and_then(|mut file| file.read_to_end(&mut bytes))
            .map_err(io_error)?;

        if self.config.effective_skip_binary() && is_binary(&bytes) {
            return Err(ScanError::BinaryFile {
                path: relative.to_path_buf(),
            });
        }
        let text = String::from_utf8(bytes).map_err(|_| ScanError::NotUtf8 {
            path: relative.to_path_buf(),
        })?;

        let matches = rules
            .iter()
            .filter(|rule| rule.applies_to(relative))
            .flat_map(|rule| engine::evaluate(rule, relative, &text))
            .collect();
        Ok((size, matches))
    }
}

/// A NUL byte in the leading window marks a file as binary.
fn is_binary(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(constants::BINARY_SNIFF_BYTES)];
    window.contains(&0)
}

/// Group a flat match list by path, sorted and deduplicated.
pub fn group_by_path(matches: impl IntoIterator<Item = Match>) -> BTreeMap<PathBuf, Vec<Match>> {
    let mut grouped: BTreeMap<PathBuf, Vec<Match>> = BTreeMap::new();
    for m in matches {
        grouped.entry(m.path.clone()).or_default().push(m);
    }
    for list in grouped.values_mut() {
        list.sort();
        list.dedup();
    }
    grouped
}
