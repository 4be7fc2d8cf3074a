//! Generation lifecycle rows.
//!
//! A generation is a named set of entries tied to one deployed version.
//! Deleting a generation cascades to its entries.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::connection::{CacheDb, StoreOp};
use super::entries::{CacheEntry, upsert_entry};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Persisted state of a generation.
///
/// `Deleted` is never stored: a deleted generation has no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Installing,
    Installed,
    Active,
    Superseded,
    Deleted,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationState::Installing => "installing",
            GenerationState::Installed => "installed",
            GenerationState::Active => "active",
            GenerationState::Superseded => "superseded",
            GenerationState::Deleted => "deleted",
        }
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installing" => Ok(GenerationState::Installing),
            "installed" => Ok(GenerationState::Installed),
            "active" => Ok(GenerationState::Active),
            "superseded" => Ok(GenerationState::Superseded),
            "deleted" => Ok(GenerationState::Deleted),
            other => Err(Error::CorruptEntry(format!("unknown generation state {other:?}"))),
        }
    }
}

/// Handle to an opened generation, passed to every entry operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationHandle {
    name: String,
}

impl GenerationHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Metadata row for one generation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    pub state: GenerationState,
    pub created_at: String,
    pub activated_at: Option<String>,
    pub entries: u64,
}

impl CacheDb {
    /// Open a generation, creating it in the `installing` state if absent.
    pub async fn open_generation(&self, name: &str) -> Result<GenerationHandle, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("generation name cannot be empty".into()));
        }
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO generations (name, state, created_at) VALUES (?1, 'installing', ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        Ok(GenerationHandle::new(name))
    }

    /// Write a whole generation in one transaction.
    ///
    /// Either every entry lands and the generation ends up `installed`
    /// (or stays `active` if it already was), or nothing changes.
    pub async fn install_generation(&self, name: &str, entries: Vec<CacheEntry>) -> Result<GenerationHandle, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("generation name cannot be empty".into()));
        }
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let count = entries.len() as u64;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO generations (name, state, created_at) VALUES (?1, 'installing', ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![owned, now],
                )?;
                for entry in &entries {
                    upsert_entry(&tx, &owned, entry)?;
                }
                tx.execute(
                    "UPDATE generations SET state = 'installed' WHERE name = ?1 AND state != 'active'",
                    params![owned],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        for _ in 0..count {
            self.record(StoreOp::Put);
        }
        tracing::debug!(generation = name, entries = count, "generation written");
        Ok(GenerationHandle::new(name))
    }

    /// Delete a generation and all its entries.
    ///
    /// Returns false if the generation did not exist.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        self.record(StoreOp::Delete);
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all generations currently in the store.
    pub async fn generation_names(&self) -> Result<BTreeSet<String>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeSet<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// All generations with their state and entry count, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<GenerationInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, g.state, g.created_at, g.activated_at, COUNT(e.key)
                     FROM generations g
                     LEFT JOIN entries e ON e.generation = g.name
                     GROUP BY g.name
                     ORDER BY g.created_at ASC, g.name ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;

                rows.into_iter()
                    .map(|(name, state, created_at, activated_at, entries)| -> Result<GenerationInfo, Error> {
                        Ok(GenerationInfo { name, state: state.parse()?, created_at, activated_at, entries: entries as u64 })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    /// State of a single generation, or `Deleted` if it has no row.
    pub async fn generation_state(&self, name: &str) -> Result<GenerationState, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<GenerationState, Error> {
                let state: Option<String> = conn
                    .query_row("SELECT state FROM generations WHERE name = ?1", params![name], |row| row.get(0))
                    .optional()?;
                match state {
                    Some(s) => s.parse(),
                    None => Ok(GenerationState::Deleted),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// The generation currently marked active, if any.
    pub async fn active_generation(&self) -> Result<Option<GenerationHandle>, Error> {
        self.conn
            .call(|conn| -> Result<Option<GenerationHandle>, Error> {
                let name: Option<String> = conn
                    .query_row("SELECT name FROM generations WHERE state = 'active'", [], |row| row.get(0))
                    .optional()?;
                Ok(name.map(GenerationHandle::new))
            })
            .await
            .map_err(Error::from)
    }

    /// Mark `name` active and any previously active generation superseded.
    pub async fn promote_generation(&self, name: &str) -> Result<GenerationHandle, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![owned],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(Error::GenerationMissing(owned));
                }
                tx.execute(
                    "UPDATE generations SET state = 'superseded' WHERE state = 'active' AND name != ?1",
                    params![owned],
                )?;
                tx.execute(
                    "UPDATE generations
                     SET activated_at = CASE WHEN state = 'active' THEN activated_at ELSE ?2 END,
                         state = 'active'
                     WHERE name = ?1",
                    params![owned, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        Ok(GenerationHandle::new(name))
    }
}
