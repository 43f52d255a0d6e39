//! Subgraph adapter for the mosaic facilitator.
//!
//! This crate implements the [`EventSource`] port from `facilitator-core`,
//! fetching decoded gateway events from the Graph-node subgraphs that index
//! the two bridged chains.
//!
//! # Features
//!
//! - Interval polling with per-entity block-number cursors
//! - One prepared GraphQL document per tracked entity collection
//! - Empty polls are skipped; a backlog drains back-to-back
//! - Genesis replay on restart, absorbed by handler idempotence
//!
//! # Usage
//!
//! ```ignore
//! use facilitator_subgraph::{SubgraphClient, SubgraphClientConfig};
//! use facilitator_core::ports::ChainTag;
//!
//! let config = SubgraphClientConfig::new(
//!     "http://localhost:8000/subgraphs/name/mosaic/origin",
//!     ChainTag::Origin,
//! );
//!
//! let client = SubgraphClient::new(config)?;
//! let mut stream = client.subscribe().await?;
//!
//! while let Some(batch) = stream.next().await {
//!     // Dispatch batch...
//! }
//! ```
//!
//! # Architecture
//!
//! Each chain's subgraph indexes a disjoint set of entity collections (the
//! origin side carries the composer and gateway events, the auxiliary side
//! the redeem pool and co-gateway events). The client polls every collection
//! with a `blockNumber_gt` cursor filter and assembles the non-empty arrays
//! into the `EventBatch` shape the dispatcher consumes.
//!
//! [`EventSource`]: facilitator_core::ports::EventSource

mod client;
mod queries;

pub use client::{SubgraphClient, SubgraphClientConfig};
