//! Core domain layer for the mosaic facilitator.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! business logic services for the cross-chain facilitator. It follows
//! hexagonal architecture principles - this is the innermost layer with
//! no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   facilitator (binary)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │     facilitator-handlers      │    facilitator-subgraph     │
//! │  (transitions, dispatcher)    │      (event polling)        │
//! ├───────────────────────────────┴─────────────────────────────┤
//! │                    facilitator-storage                      │
//! │                       (PostgreSQL)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  facilitator-core  ← YOU ARE HERE           │
//! │                 (models, ports, services)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Message, MessageTransferRequest)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Core business logic (FacilitatorService)
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Ports
//!
//! Ports define interfaces that external adapters must implement:
//!
//! - [`ports::EventSource`] - Deliver decoded gateway events from one chain
//! - [`ports::MessageRepository`] / [`ports::MessageTransferRequestRepository`]
//!   - Persist and query facilitator entities
//! - [`ports::Dispatcher`] - Route an event batch to its handlers
//!
//! ## Reconciliation model
//!
//! The two chains report on the same messages independently and without
//! any mutual ordering, so events arrive duplicated and out of order. The
//! core absorbs this by construction: status transitions on
//! [`models::Message`] only ever move forward, and repository saves resolve
//! same-key races with deterministic tie-breaks. Replaying any prefix of
//! history is therefore always safe.
//!
//! ## Facilitator Lifecycle
//!
//! 1. Subscribe to decoded event batches from both chains
//! 2. Dispatch each batch to the registered per-event-type handlers
//! 3. Handlers compute transitions and persist through the repositories
//! 4. On stream failure, resubscribe with backoff and replay
//! 5. On shutdown, stop between dispatches

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
