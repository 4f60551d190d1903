//! SQLite-backed store for partitioned HTTP response caches.
//!
//! This module provides named cache partitions holding request/response
//! pairs, with async access via tokio-rusqlite. It supports:
//!
//! - Request identity hashing (method + URL) with SHA-256
//! - Versioned partition naming and stale-partition detection
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::RequestKey;
pub use migrations::{SCHEMA_VERSION, SchemaReport};
pub use partitions::{PartitionPurpose, PartitionSet, PartitionStats};
