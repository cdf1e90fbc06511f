//! Schema migrations keyed on `PRAGMA user_version`.

pub mod v001_initial;

use ratchet_core::errors::StoreError;
use rusqlite::Connection;

use crate::sqlite_err;

const MIGRATIONS: &[(u32, &str)] = &[(1, v001_initial::MIGRATION_SQL)];

pub fn current_version(conn: &Connection) -> Result<u32, StoreError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(sqlite_err)
}

/// Apply every migration newer than the stored version, each in its own
/// transaction.
pub fn run_migrations(conn: &Connection) -> Result<u32, StoreError> {
    let mut version = current_version(conn)?;
    for &(target, sql) in MIGRATIONS {
        if target <= version {
            continue;
        }
        let batch = format!("BEGIN;\n{sql}\nPRAGMA user_version = {target};\nCOMMIT;");
        if let Err(e) = conn.execute_batch(&batch) {
            let _ = conn.execute_batch("ROLLBACK;");
            return Err(StoreError::MigrationFailed {
                version: target,
                message: e.to_string(),
            });
        }
        tracing::debug!(version = target, "diff cache migrated");
        version = target;
    }
    Ok(version)
}
