//! Storage layer for the mosaic facilitator.
//!
//! This crate provides PostgreSQL implementations of the repository traits
//! defined in `facilitator-core`. It handles all database interactions
//! including connection pooling, migrations, and conflict-resolving writes.
//!
//! # Architecture
//!
//! The storage layer follows the repository pattern:
//!
//! - [`postgres::Database`] - Connection pool management
//! - [`postgres::PgMessageRepository`] - Gateway messages keyed by hash
//! - [`postgres::PgMessageTransferRequestRepository`] - Transfer requests
//!   with the block-height tie-break enforced inside the upsert
//!
//! # Usage
//!
//! ```ignore
//! use facilitator_storage::{Database, DatabaseConfig, PgMessageRepository};
//!
//! // Connect to the database
//! let config = DatabaseConfig::for_facilitator(&database_url);
//! let db = Database::connect(&config).await?;
//!
//! // Run migrations
//! db.migrate().await?;
//!
//! // Create repositories
//! let messages = Arc::new(PgMessageRepository::new(&db));
//! ```

pub mod postgres;

pub use postgres::{
    Database, DatabaseConfig, PgMessageRepository, PgMessageTransferRequestRepository, PurgeStats,
};
