//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - The versioned cache store with SQLite backend
//! - Request/response records crossing the engine boundary
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheEntry, GenerationHandle, GenerationInfo, GenerationState, StoreStats};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, RequestIdentity, Response};
