//! Core types and shared functionality for edgecache.
//!
//! This crate provides:
//! - Partitioned HTTP response cache with SQLite backend
//! - HTTP value types shared by the store and the controller
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, PartitionPurpose, PartitionSet, PartitionStats, RequestKey, SchemaReport};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::HttpResponse;
