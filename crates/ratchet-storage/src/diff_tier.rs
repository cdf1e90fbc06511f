//! SQLite-backed persistent tier for the history diff cache.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ratchet_core::errors::StoreError;
use ratchet_core::traits::DiffTier;
use ratchet_core::types::{AddedLine, FileDiff};
use rusqlite::{params, Connection, OptionalExtension};

use crate::migrations;
use crate::pragmas::apply_pragmas;
use crate::sqlite_err;

/// Diffs keyed by (commit id, path), surviving across runs.
pub struct SqliteDiffTier {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteDiffTier {
    /// Open or create the database at `path`, apply pragmas, migrate.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }
        let conn = Connection::open(path).map_err(sqlite_err)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// In-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(sqlite_err)?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let guard = self.conn.lock().map_err(|_| StoreError::SqliteError {
            message: "connection lock poisoned".to_string(),
        })?;
        f(&guard)
    }

    pub fn entry_count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM diff_cache", [], |row| row.get(0))
                .map_err(sqlite_err)
        })
    }

    /// Delete rows older than `max_age_secs`. Returns the number removed.
    pub fn prune_older_than(&self, max_age_secs: u64) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM diff_cache WHERE created_at < unixepoch() - ?1",
                params![max_age_secs as i64],
            )
            .map_err(sqlite_err)
        })
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl DiffTier for SqliteDiffTier {
    fn load(&self, commit: &str, path: &Path) -> Result<Option<FileDiff>, StoreError> {
        let row: Option<String> = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT added_json FROM diff_cache WHERE commit_id = ?1 AND path = ?2",
                )
                .map_err(sqlite_err)?;
            stmt.query_row(params![commit, path_key(path)], |row| row.get(0))
                .optional()
                .map_err(sqlite_err)
        })?;

        let Some(json) = row else {
            return Ok(None);
        };
        let added: Vec<AddedLine> =
            serde_json::from_str(&json).map_err(|e| StoreError::Malformed {
                path: format!("diff_cache({commit}, {})", path.display()),
                message: e.to_string(),
            })?;
        Ok(Some(FileDiff::new(path, added)))
    }

    fn store(&self, commit: &str, diff: &FileDiff) -> Result<(), StoreError> {
        let json = serde_json::to_string(&diff.added).map_err(|e| StoreError::Malformed {
            path: format!("diff_cache({commit}, {})", diff.path.display()),
            message: e.to_string(),
        })?;
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "INSERT OR REPLACE INTO diff_cache (commit_id, path, added_json)
                     VALUES (?1, ?2, ?3)",
                )
                .map_err(sqlite_err)?;
            stmt.execute(params![commit, path_key(&diff.path), json])
                .map_err(sqlite_err)?;
            Ok(())
        })
    }
}

impl std::fmt::Debug for SqliteDiffTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDiffTier")
            .field("path", &self.path)
            .finish()
    }
}
