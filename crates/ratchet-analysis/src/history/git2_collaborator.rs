//! libgit2-backed [`GitCollaborator`].

use std::path::{Path, PathBuf};

use git2::{Delta, Diff, DiffFormat, DiffOptions, ErrorCode, Repository, Sort, Tree};
use ratchet_core::errors::HistoryError;
use ratchet_core::types::collections::ParentIds;
use ratchet_core::types::{AddedLine, CommitRecord, FileDiff};

use super::collaborator::GitCollaborator;

/// Reads history through libgit2.
///
/// Paths in and out are relative to the directory passed to
/// [`Self::discover`], which may sit below the repository's work tree.
/// Repository paths outside that directory are never reported.
///
/// `git2::Repository` is not `Sync`, so every query opens its own handle.
/// Opening is cheap next to the diff work each query does.
#[derive(Debug, Clone)]
pub struct Git2Collaborator {
    workdir: PathBuf,
    git_dir: PathBuf,
    /// `path` relative to `workdir`; empty when they are the same.
    prefix: PathBuf,
}

impl Git2Collaborator {
    /// Find the repository containing `path` and root every query at `path`.
    pub fn discover(path: &Path) -> Result<Self, HistoryError> {
        let repo = Repository::discover(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => HistoryError::NotARepository {
                path: path.display().to_string(),
            },
            _ => git_error(e),
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| HistoryError::NotARepository {
                path: path.display().to_string(),
            })?
            .to_path_buf();
        let prefix = canonical(path)
            .strip_prefix(canonical(&workdir))
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if !prefix.as_os_str().is_empty() {
            tracing::debug!(prefix = %prefix.display(), "rooted below the work tree");
        }
        Ok(Self {
            workdir,
            git_dir: repo.path().to_path_buf(),
            prefix,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The query root relative to the work tree.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn to_repo(&self, path: &Path) -> PathBuf {
        self.prefix.join(path)
    }

    /// `None` for repository paths outside the query root.
    fn to_root(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.prefix).ok().map(Path::to_path_buf)
    }

    fn rooted(&self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.iter().filter_map(|p| self.to_root(p)).collect()
    }

    fn open(&self) -> Result<Repository, HistoryError> {
        Repository::open(&self.git_dir).map_err(git_error)
    }

    fn commit<'r>(repo: &'r Repository, revspec: &str) -> Result<git2::Commit<'r>, HistoryError> {
        repo.revparse_single(revspec)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| match e.code() {
                ErrorCode::NotFound | ErrorCode::InvalidSpec => HistoryError::ReferenceNotFound {
                    reference: revspec.to_string(),
                },
                _ => git_error(e),
            })
    }

    /// Tree of the first parent, or `None` for a root commit.
    fn parent_tree<'r>(commit: &git2::Commit<'r>) -> Result<Option<Tree<'r>>, HistoryError> {
        if commit.parent_count() == 0 {
            return Ok(None);
        }
        let parent = commit.parent(0).map_err(git_error)?;
        parent.tree().map(Some).map_err(git_error)
    }

    fn head_tree(repo: &Repository) -> Option<Tree<'_>> {
        repo.head().ok().and_then(|head| head.peel_to_tree().ok())
    }
}

impl GitCollaborator for Git2Collaborator {
    fn tracked_files(&self) -> Result<Vec<PathBuf>, HistoryError> {
        let repo = self.open()?;
        let index = repo.index().map_err(git_error)?;
        let mut files: Vec<PathBuf> = index
            .iter()
            .filter_map(|entry| {
                self.to_root(Path::new(String::from_utf8_lossy(&entry.path).as_ref()))
            })
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn changed_files(&self, base_ref: &str) -> Result<Vec<PathBuf>, HistoryError> {
        let repo = self.open()?;
        let base = Self::commit(&repo, base_ref)?;
        let head = Self::commit(&repo, "HEAD")?;
        let merge_base = repo.merge_base(base.id(), head.id()).map_err(git_error)?;
        let tree = repo
            .find_commit(merge_base)
            .and_then(|c| c.tree())
            .map_err(git_error)?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let diff = repo
            .diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))
            .map_err(git_error)?;

        let mut files = self.rooted(surviving_paths(&diff));
        files.sort();
        files.dedup();
        tracing::debug!(base = base_ref, files = files.len(), "resolved changed files");
        Ok(files)
    }

    fn log(&self, from_ref: &str, limit: usize) -> Result<Vec<CommitRecord>, HistoryError> {
        let repo = self.open()?;
        let start = Self::commit(&repo, from_ref)?;

        let mut walk = repo.revwalk().map_err(git_error)?;
        walk.set_sorting(Sort::TOPOLOGICAL).map_err(git_error)?;
        walk.simplify_first_parent().map_err(git_error)?;
        walk.push(start.id()).map_err(git_error)?;

        let mut commits = Vec::with_capacity(limit.min(256));
        for oid in walk.take(limit) {
            let oid = oid.map_err(git_error)?;
            let commit = repo.find_commit(oid).map_err(git_error)?;
            let parents: ParentIds = commit.parent_ids().map(|p| p.to_string()).collect();
            commits.push(CommitRecord {
                id: oid.to_string(),
                parents,
                timestamp: commit.time().seconds(),
                author: commit.author().name().unwrap_or_default().to_string(),
                summary: commit.summary().unwrap_or_default().to_string(),
            });
        }
        Ok(commits)
    }

    fn changed_paths(&self, commit: &str) -> Result<Vec<PathBuf>, HistoryError> {
        let repo = self.open()?;
        let commit = Self::commit(&repo, commit)?;
        let tree = commit.tree().map_err(git_error)?;
        let parent = Self::parent_tree(&commit)?;
        let diff = repo
            .diff_tree_to_tree(parent.as_ref(), Some(&tree), None)
            .map_err(git_error)?;
        Ok(self.rooted(surviving_paths(&diff)))
    }

    fn file_diff(&self, commit: &str, path: &Path) -> Result<FileDiff, HistoryError> {
        let repo = self.open()?;
        let commit = Self::commit(&repo, commit)?;
        let tree = commit.tree().map_err(git_error)?;
        let parent = Self::parent_tree(&commit)?;

        let mut opts = path_options(&self.to_repo(path));
        let diff = repo
            .diff_tree_to_tree(parent.as_ref(), Some(&tree), Some(&mut opts))
            .map_err(git_error)?;
        Ok(FileDiff::new(path, added_lines(&diff)?))
    }

    fn worktree_diff(&self, path: &Path) -> Result<FileDiff, HistoryError> {
        let repo = self.open()?;
        let head = Self::head_tree(&repo);

        let mut opts = path_options(&self.to_repo(path));
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        let diff = repo
            .diff_tree_to_workdir_with_index(head.as_ref(), Some(&mut opts))
            .map_err(git_error)?;
        Ok(FileDiff::new(path, added_lines(&diff)?))
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn git_error(e: git2::Error) -> HistoryError {
    HistoryError::Git {
        message: e.message().to_string(),
    }
}

/// Zero-context diff options restricted to exactly `path`.
fn path_options(path: &Path) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.pathspec(path.to_string_lossy().replace('\\', "/"))
        .disable_pathspec_match(true)
        .context_lines(0);
    opts
}

/// New-side paths of every delta that is not a deletion.
fn surviving_paths(diff: &Diff<'_>) -> Vec<PathBuf> {
    diff.deltas()
        .filter(|delta| delta.status() != Delta::Deleted)
        .filter_map(|delta| delta.new_file().path().map(Path::to_path_buf))
        .collect()
}

/// `+` lines with their post-change line numbers, trailing whitespace
/// removed.
fn added_lines(diff: &Diff<'_>) -> Result<Vec<AddedLine>, HistoryError> {
    let mut added = Vec::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if line.origin() == '+' {
            if let Some(lineno) = line.new_lineno() {
                added.push(AddedLine {
                    line: lineno as usize,
                    text: String::from_utf8_lossy(line.content()).trim_end().to_string(),
                });
            }
        }
        true
    })
    .map_err(git_error)?;
    Ok(added)
}
