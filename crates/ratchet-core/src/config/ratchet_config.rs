//! Top-level ratchet configuration with 4-layer resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{CacheConfig, HistoryConfig, ScanConfig, StoreConfig};
use crate::constants;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sections.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`RATCHET_*`)
/// 3. Project config (`ratchet.toml` in the repository root)
/// 4. User config (`~/.ratchet/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RatchetConfig {
    pub scan: ScanConfig,
    pub history: HistoryConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub scan_threads: Option<usize>,
    pub scan_max_files: Option<usize>,
    pub history_base_ref: Option<String>,
    pub history_commit_budget: Option<usize>,
    pub attribution_limit: Option<usize>,
    pub counts_path: Option<PathBuf>,
}

impl RatchetConfig {
    /// Load configuration with 4-layer resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        ::tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(constants::PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &RatchetConfig) -> Result<(), ConfigError> {
        let positive: [(&str, Option<u64>); 5] = [
            ("scan.max_file_size", config.scan.max_file_size),
            ("scan.max_files", config.scan.max_files.map(|v| v as u64)),
            (
                "history.commit_budget",
                config.history.commit_budget.map(|v| v as u64),
            ),
            (
                "history.attribution_limit",
                config.history.attribution_limit.map(|v| v as u64),
            ),
            ("cache.capacity", config.cache.capacity),
        ];
        for (field, value) in positive {
            if value == Some(0) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(name) = &config.scan.ignore_file_name {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::ValidationFailed {
                    field: "scan.ignore_file_name".to_string(),
                    message: "must be a plain file name".to_string(),
                });
            }
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(constants::USER_CONFIG_DIR).join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut RatchetConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: RatchetConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it has a value.
    fn merge(base: &mut RatchetConfig, other: &RatchetConfig) {
        // Scan
        if other.scan.max_file_size.is_some() {
            base.scan.max_file_size = other.scan.max_file_size;
        }
        if other.scan.threads.is_some() {
            base.scan.threads = other.scan.threads;
        }
        if other.scan.max_files.is_some() {
            base.scan.max_files = other.scan.max_files;
        }
        if other.scan.deadline_secs.is_some() {
            base.scan.deadline_secs = other.scan.deadline_secs;
        }
        if other.scan.ignore_file_name.is_some() {
            base.scan.ignore_file_name = other.scan.ignore_file_name.clone();
        }
        if !other.scan.extra_exclude.is_empty() {
            base.scan.extra_exclude = other.scan.extra_exclude.clone();
        }
        if other.scan.skip_binary.is_some() {
            base.scan.skip_binary = other.scan.skip_binary;
        }

        // History
        if other.history.base_ref.is_some() {
            base.history.base_ref = other.history.base_ref.clone();
        }
        if other.history.head_ref.is_some() {
            base.history.head_ref = other.history.head_ref.clone();
        }
        if other.history.commit_budget.is_some() {
            base.history.commit_budget = other.history.commit_budget;
        }
        if other.history.deadline_secs.is_some() {
            base.history.deadline_secs = other.history.deadline_secs;
        }
        if other.history.attribution_limit.is_some() {
            base.history.attribution_limit = other.history.attribution_limit;
        }
        if other.history.include_working_tree.is_some() {
            base.history.include_working_tree = other.history.include_working_tree;
        }

        // Cache
        if other.cache.capacity.is_some() {
            base.cache.capacity = other.cache.capacity;
        }
        if other.cache.ttl_secs.is_some() {
            base.cache.ttl_secs = other.cache.ttl_secs;
        }
        if other.cache.persist_path.is_some() {
            base.cache.persist_path = other.cache.persist_path.clone();
        }

        // Store
        if other.store.counts_path.is_some() {
            base.store.counts_path = other.store.counts_path.clone();
        }
        if other.store.rules_path.is_some() {
            base.store.rules_path = other.store.rules_path.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `RATCHET_SCAN_THREADS`, `RATCHET_HISTORY_BASE_REF`, etc.
    fn apply_env_overrides(config: &mut RatchetConfig) {
        if let Ok(val) = std::env::var("RATCHET_SCAN_MAX_FILE_SIZE") {
            if let Ok(v) = val.parse::<u64>() {
                config.scan.max_file_size = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RATCHET_SCAN_THREADS") {
            if let Ok(v) = val.parse::<usize>() {
                config.scan.threads = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RATCHET_SCAN_MAX_FILES") {
            if let Ok(v) = val.parse::<usize>() {
                config.scan.max_files = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RATCHET_HISTORY_BASE_REF") {
            config.history.base_ref = Some(val);
        }
        if let Ok(val) = std::env::var("RATCHET_HISTORY_COMMIT_BUDGET") {
            if let Ok(v) = val.parse::<usize>() {
                config.history.commit_budget = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RATCHET_HISTORY_ATTRIBUTION_LIMIT") {
            if let Ok(v) = val.parse::<usize>() {
                config.history.attribution_limit = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RATCHET_CACHE_CAPACITY") {
            if let Ok(v) = val.parse::<u64>() {
                config.cache.capacity = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RATCHET_STORE_COUNTS_PATH") {
            config.store.counts_path = Some(PathBuf::from(val));
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut RatchetConfig, cli: &CliOverrides) {
        if let Some(v) = cli.scan_threads {
            config.scan.threads = Some(v);
        }
        if let Some(v) = cli.scan_max_files {
            config.scan.max_files = Some(v);
        }
        if let Some(ref v) = cli.history_base_ref {
            config.history.base_ref = Some(v.clone());
        }
        if let Some(v) = cli.history_commit_budget {
            config.history.commit_budget = Some(v);
        }
        if let Some(v) = cli.attribution_limit {
            config.history.attribution_limit = Some(v);
        }
        if let Some(ref v) = cli.counts_path {
            config.store.counts_path = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
