//! PostgreSQL storage adapter.
//!
//! This module implements the repository traits defined in
//! `facilitator-core` using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool, migrations, purge
//! - [`PgMessageRepository`] - Gateway messages, whole-row upsert
//! - [`PgMessageTransferRequestRepository`] - Transfer requests, conditional
//!   upsert carrying the block-height tie-break
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_facilitator(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let messages = Arc::new(PgMessageRepository::new(&db));
//! let requests = Arc::new(PgMessageTransferRequestRepository::new(&db));
//! ```

mod database;
mod helpers;
mod message_repo;
mod transfer_request_repo;

pub use database::{Database, DatabaseConfig, PurgeStats};
pub use message_repo::PgMessageRepository;
pub use transfer_request_repo::PgMessageTransferRequestRepository;
