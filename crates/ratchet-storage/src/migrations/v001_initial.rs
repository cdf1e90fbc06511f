//! V001: diff cache table.

pub const MIGRATION_SQL: &str = r#"
-- Lines a commit added to a file. Commit ids are immutable, so rows are
-- only ever replaced with identical content.
CREATE TABLE IF NOT EXISTS diff_cache (
    commit_id TEXT NOT NULL,
    path TEXT NOT NULL,
    added_json TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch()),
    PRIMARY KEY (commit_id, path)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_diff_cache_created
    ON diff_cache(created_at);
"#;
