//! Entry match/put operations within a generation.

use super::connection::{CacheDb, StoreOp};
use super::generations::GenerationHandle;
use crate::Error;
use crate::http::{Headers, RequestIdentity, Response};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Upsert that silently skips generations that no longer exist.
const UPSERT_ENTRY: &str = "INSERT INTO entries (generation, key, method, url, status, headers_json, body, captured_at)
    SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
    WHERE EXISTS (SELECT 1 FROM generations WHERE name = ?1)
    ON CONFLICT(generation, key) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        headers_json = excluded.headers_json,
        body = excluded.body,
        captured_at = excluded.captured_at";

/// A stored request/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub identity: RequestIdentity,
    pub response: Response,
}

/// Write one entry on an open connection or transaction.
///
/// Returns the number of rows changed (0 when the generation is gone).
pub(crate) fn upsert_entry(conn: &rusqlite::Connection, generation: &str, entry: &CacheEntry) -> Result<usize, Error> {
    let headers_json =
        serde_json::to_string(&entry.response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    let mut stmt = conn.prepare_cached(UPSERT_ENTRY)?;
    let changed = stmt.execute(params![
        generation,
        entry.identity.key(),
        &entry.identity.method,
        &entry.identity.url,
        entry.response.status,
        headers_json,
        entry.response.body.as_ref(),
        entry.response.captured_at.to_rfc3339(),
    ])?;
    Ok(changed)
}

impl CacheDb {
    /// Exact-key lookup of a request identity in a generation.
    ///
    /// Returns None on a miss, including when the generation was deleted.
    pub async fn match_entry(
        &self, generation: &GenerationHandle, identity: &RequestIdentity,
    ) -> Result<Option<CacheEntry>, Error> {
        self.record(StoreOp::Match);
        let generation = generation.name().to_string();
        let key = identity.key();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let row = conn
                    .query_row(
                        "SELECT method, url, status, headers_json, body, captured_at
                         FROM entries WHERE generation = ?1 AND key = ?2",
                        params![generation, key],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, u16>(2)?,
                                row.get::<_, String>(3)?,
                                row.get::<_, Vec<u8>>(4)?,
                                row.get::<_, String>(5)?,
                            ))
                        },
                    )
                    .optional()?;

                let Some((method, url, status, headers_json, body, captured_at)) = row else {
                    return Ok(None);
                };

                let headers: Headers =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                let captured_at = DateTime::parse_from_rfc3339(&captured_at)
                    .map_err(|e| Error::CorruptEntry(e.to_string()))?
                    .with_timezone(&Utc);

                Ok(Some(CacheEntry {
                    identity: RequestIdentity { method, url },
                    response: Response { status, headers, body: Bytes::from(body), captured_at },
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under a request identity, replacing any prior entry.
    ///
    /// Writing into a generation that has been deleted is a no-op and
    /// returns false.
    pub async fn put_entry(
        &self, generation: &GenerationHandle, identity: &RequestIdentity, response: &Response,
    ) -> Result<bool, Error> {
        self.record(StoreOp::Put);
        let generation = generation.name().to_string();
        let entry = CacheEntry { identity: identity.clone(), response: response.clone() };
        self.conn
            .call(move |conn| -> Result<bool, Error> { Ok(upsert_entry(conn, &generation, &entry)? > 0) })
            .await
            .map_err(Error::from)
    }

    /// Identities stored in a generation, ordered by URL.
    pub async fn entry_identities(&self, generation: &GenerationHandle) -> Result<Vec<RequestIdentity>, Error> {
        let generation = generation.name().to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestIdentity>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM entries WHERE generation = ?1 ORDER BY url ASC, method ASC")?;
                let identities = stmt
                    .query_map(params![generation], |row| Ok(RequestIdentity { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(identities)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a generation.
    pub async fn count_entries(&self, generation: &GenerationHandle) -> Result<u64, Error> {
        let generation = generation.name().to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
