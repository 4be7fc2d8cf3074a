//! Schema versions for the cache store.
//!
//! `_migrations` holds one row per applied version. On open, every embedded
//! script above the recorded maximum runs in its own transaction together
//! with its version row.

use super::Error;
use tokio_rusqlite::rusqlite::{Connection as SqliteConnection, params};
use tokio_rusqlite::Connection;

/// Embedded schema scripts, ascending by version.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_generations.sql")),
    (2, include_str!("../../migrations/002_entries.sql")),
];

const VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)";

/// Bring the schema up to the newest embedded version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose script failed;
/// earlier versions stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(VERSION_TABLE, [])?;
        let applied = schema_version(conn)?;

        for (version, script) in MIGRATIONS.iter().filter(|(version, _)| *version > applied) {
            apply(conn, *version, script)?;
            tracing::debug!(version, "applied cache migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn schema_version(conn: &SqliteConnection) -> Result<i64, Error> {
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
    Ok(version)
}

fn apply(conn: &mut SqliteConnection, version: i64, script: &str) -> Result<(), Error> {
    let failed = |e: tokio_rusqlite::rusqlite::Error| Error::MigrationFailed(format!("version {version}: {e}"));

    let tx = conn.transaction().map_err(failed)?;
    tx.execute_batch(script).map_err(failed)?;
    tx.execute(
        "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
        params![version, chrono::Utc::now().to_rfc3339()],
    )
    .map_err(failed)?;
    tx.commit().map_err(failed)
}
