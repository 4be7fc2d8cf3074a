//! SQLite-backed store of versioned cache generations.
//!
//! This module provides a durable, namespaced key→response store using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named generations, each holding at most one entry per request identity
//! - Atomic whole-generation installs and cascading generation deletes
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::{CacheDb, StoreStats};
pub use entries::CacheEntry;
pub use generations::{GenerationHandle, GenerationInfo, GenerationState};
