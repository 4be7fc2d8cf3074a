//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! (WAL mode, foreign keys for cascading generation deletes), and running
//! migrations.

use super::migrations;
use crate::Error;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Cache store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the connection and the counters.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    matches: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
}

/// Point-in-time count of store operations issued through a [`CacheDb`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct StoreStats {
    pub matches: u64,
    pub puts: u64,
    pub deletes: u64,
}

impl StoreStats {
    pub fn total(&self) -> u64 {
        self.matches + self.puts + self.deletes
    }
}

pub(crate) enum StoreOp {
    Match,
    Put,
    Delete,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, counters: Arc::default() })
    }

    /// Operation counters since this handle (or the one it was cloned from) opened.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            matches: self.counters.matches.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record(&self, op: StoreOp) {
        let counter = match op {
            StoreOp::Match => &self.counters.matches,
            StoreOp::Put => &self.counters.puts,
            StoreOp::Delete => &self.counters.deletes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let fk: i64 = db
            .conn
            .call(|conn| conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[tokio::test]
    async fn test_stats_shared_between_clones() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let clone = db.clone();
        clone.record(StoreOp::Match);
        clone.record(StoreOp::Put);
        assert_eq!(db.stats(), StoreStats { matches: 1, puts: 1, deletes: 0 });
        assert_eq!(db.stats().total(), 2);
    }
}
