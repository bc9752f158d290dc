//! # Archive Infrastructure
//!
//! Concrete implementations of the ports defined in `archive-core`.
//! This crate contains database, object storage, auth and job queue integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL record store via SeaORM
//! - `auth` - Verification of provider-issued JWTs
//! - `storage-api` - Object storage over the hosted storage REST API

pub mod database;
pub mod jobs;
pub mod storage;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use database::{InMemoryPostRepository, InMemoryProfileRepository};
pub use jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};
pub use storage::InMemoryObjectStore;

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresProfileRepository,
};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtConfigError, JwtTokenService};

#[cfg(feature = "storage-api")]
pub use storage::{StorageApiConfig, StorageApiObjectStore};
