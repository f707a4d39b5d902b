//! Database schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its bookkeeping row, so a failed
//! migration leaves the schema at the previous version.

use super::Error;
use tokio_rusqlite::{Connection, params};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version; versions are never reused.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "result_cache", sql: include_str!("../../migrations/001_result_cache.sql") },
    Migration { version: 2, name: "search_history", sql: include_str!("../../migrations/002_search_history.sql") },
];

/// Highest version a fresh database ends up at.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Apply every migration newer than the recorded version.
///
/// Returns the schema version after the run.
///
/// # Errors
///
/// Returns `MigrationFailed` naming the migration whose SQL failed.
pub async fn run(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let mut current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        let start = current;
        for migration in MIGRATIONS.iter().filter(|m| m.version > start) {
            tracing::debug!(version = migration.version, name = migration.name, "applying cache migration");

            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} (v{}): {e}", migration.name, migration.version)))?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;

            current = migration.version;
        }

        Ok(current)
    })
    .await
    .map_err(Error::from)
}
