//! Shared constants for the ratchet engine.

/// Engine version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default maximum file size to scan: 1MB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Number of leading bytes inspected for a NUL byte when sniffing binaries.
pub const BINARY_SNIFF_BYTES: usize = 8192;

/// Default number of first-parent commits the attributor may visit.
pub const DEFAULT_COMMIT_BUDGET: usize = 200;

/// Default number of attributions returned by "recently broken" reports.
pub const DEFAULT_ATTRIBUTION_LIMIT: usize = 10;

/// Commits fetched per page while walking history.
pub const LOG_PAGE_SIZE: usize = 64;

/// Default capacity of the in-memory history cache (entries).
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Column width a tab advances to when measuring indentation.
pub const TAB_WIDTH: usize = 4;

/// Default base reference for "changed files" mode.
pub const DEFAULT_BASE_REF: &str = "origin/main";

/// Default reference the history walk starts from.
pub const DEFAULT_HEAD_REF: &str = "HEAD";

/// Default name of the persisted allowed-count file.
pub const DEFAULT_COUNTS_FILE: &str = "ratchet_values.json";

/// Default name of the rule definition file.
pub const DEFAULT_RULES_FILE: &str = "ratchet_rules.toml";

/// Default name of per-directory ignore files.
pub const DEFAULT_IGNORE_FILE: &str = ".ratchetignore";

/// Project-level settings file, looked up in the repository root.
pub const PROJECT_CONFIG_FILE: &str = "ratchet.toml";

/// User-level settings directory under `$HOME`.
pub const USER_CONFIG_DIR: &str = ".ratchet";

/// Paths recognized as test files when a rule sets `exclude_test_files`.
pub const TEST_FILE_PATTERN: &str = r"(^|/)(test_[^/\\]*\.py|[^/\\]*_test\.py)$";

/// Built-in root exclusions, evaluated before the root ignore file.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "*.pyc",
    "__pycache__/",
    "venv/",
    ".venv/",
    "*.egg-info/",
    "build/",
    "dist/",
    ".git/",
    ".tox/",
    ".pytest_cache/",
    ".mypy_cache/",
    ".coverage",
    "htmlcov/",
    "node_modules/",
    "target/",
    "*.so",
    "*.pyd",
    "*.dll",
    "*.dylib",
];
