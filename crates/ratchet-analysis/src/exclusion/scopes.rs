//! Per-directory exclusion scopes with ignore-file precedence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::{Match as IgnoreMatch, WalkBuilder};
use ratchet_core::constants;
use ratchet_core::errors::ConfigError;

/// Patterns declared by one directory, compiled relative to that directory.
#[derive(Debug, Clone)]
struct Scope {
    patterns: Vec<String>,
    matcher: Gitignore,
}

/// Tree of ignore-pattern lists, keyed by repository-relative directory
/// (the empty path is the root).
///
/// A path's state is decided by walking its ancestor scopes root to leaf;
/// the last scope with a matching pattern wins, and within a scope the last
/// matching pattern wins. `!pattern` re-includes. A path under an excluded
/// directory is excluded regardless of later patterns, as with git.
#[derive(Debug, Clone)]
pub struct ExclusionScopes {
    root: PathBuf,
    scopes: BTreeMap<PathBuf, Scope>,
}

impl ExclusionScopes {
    /// No scopes at all: nothing is excluded.
    pub fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            scopes: BTreeMap::new(),
        }
    }

    /// Root scope seeded with the built-in defaults and `extra` patterns.
    pub fn with_defaults(root: &Path, extra: &[String]) -> Result<Self, ConfigError> {
        let mut scopes = Self::empty(root);
        let mut patterns: Vec<String> = constants::DEFAULT_EXCLUDE_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        patterns.extend(extra.iter().cloned());
        scopes.add_scope(Path::new(""), patterns)?;
        Ok(scopes)
    }

    /// Defaults plus every `ignore_file_name` found under `root`.
    ///
    /// `.git` is never descended into.
    pub fn discover(
        root: &Path,
        ignore_file_name: &str,
        extra: &[String],
    ) -> Result<Self, ConfigError> {
        let mut scopes = Self::with_defaults(root, extra)?;

        let mut found: Vec<PathBuf> = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter(|entry| entry.file_name() == ignore_file_name)
            .map(|entry| entry.into_path())
            .collect();
        found.sort();

        for file in found {
            let dir = file
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .unwrap_or_else(|| Path::new(""))
                .to_path_buf();
            let content = std::fs::read_to_string(&file).map_err(|e| ConfigError::ParseError {
                path: file.display().to_string(),
                message: e.to_string(),
            })?;
            let patterns = parse_ignore_file(&content);
            tracing::debug!(
                dir = %dir.display(),
                patterns = patterns.len(),
                "loaded exclusion scope"
            );
            scopes.add_scope(&dir, patterns)?;
        }

        Ok(scopes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append `patterns` to the scope of `dir` (repository-relative).
    pub fn add_scope(&mut self, dir: &Path, patterns: Vec<String>) -> Result<(), ConfigError> {
        let dir = dir.to_path_buf();
        let mut all = self
            .scopes
            .get(&dir)
            .map(|s| s.patterns.clone())
            .unwrap_or_default();
        all.extend(patterns);

        let mut builder = GitignoreBuilder::new(self.root.join(&dir));
        for pattern in &all {
            builder
                .add_line(None, pattern)
                .map_err(|e| invalid_pattern(&dir, pattern, e))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| invalid_pattern(&dir, "<scope>", e))?;

        self.scopes.insert(
            dir,
            Scope {
                patterns: all,
                matcher,
            },
        );
        Ok(())
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Whether `path` (repository-relative) is excluded.
    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        let mut ancestors: Vec<&Path> = path
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .collect();
        ancestors.reverse();

        ancestors.into_iter().any(|dir| self.decide(dir, true)) || self.decide(path, is_dir)
    }

    /// Result of the scopes on `path` itself, ignoring its parents.
    fn decide(&self, path: &Path, is_dir: bool) -> bool {
        let mut excluded = false;
        for (dir, scope) in &self.scopes {
            let Ok(relative) = path.strip_prefix(dir) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            match scope.matcher.matched(relative, is_dir) {
                IgnoreMatch::Ignore(_) => excluded = true,
                IgnoreMatch::Whitelist(_) => excluded = false,
                IgnoreMatch::None => {}
            }
        }
        excluded
    }

    /// Every pattern rebased to the root, in root-to-leaf scope order.
    pub fn merged_patterns(&self) -> Vec<String> {
        self.scopes
            .iter()
            .flat_map(|(dir, scope)| scope.patterns.iter().map(move |p| rebase(dir, p)))
            .collect()
    }

    /// Equivalent single-scope form built from [`Self::merged_patterns`].
    pub fn flatten(&self) -> Result<Self, ConfigError> {
        let mut flat = Self::empty(&self.root);
        flat.add_scope(Path::new(""), self.merged_patterns())?;
        Ok(flat)
    }
}

fn invalid_pattern(dir: &Path, pattern: &str, error: ignore::Error) -> ConfigError {
    ConfigError::ValidationFailed {
        field: format!("exclusion scope '{}'", dir.display()),
        message: format!("invalid pattern '{pattern}': {error}"),
    }
}

/// Non-empty, non-comment lines with surrounding quotes removed.
pub fn parse_ignore_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Rewrite a pattern declared in `dir` so it means the same thing when
/// declared at the root.
fn rebase(dir: &Path, pattern: &str) -> String {
    if dir.as_os_str().is_empty() {
        return pattern.to_string();
    }
    let (negation, body) = match pattern.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", pattern),
    };
    let dir = dir.to_string_lossy().replace('\\', "/");
    let without_trailing = body.trim_end_matches('/');
    let anchored = body.starts_with('/') || without_trailing.contains('/');
    let body = body.trim_start_matches('/');

    if anchored {
        format!("{negation}/{dir}/{body}")
    } else {
        format!("{negation}/{dir}/**/{body}")
    }
}
