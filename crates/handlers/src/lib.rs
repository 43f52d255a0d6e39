//! Event handlers for the mosaic facilitator.
//!
//! This crate turns decoded gateway events into persisted domain state.
//! Each subscribed event type has exactly one handler; the set is closed
//! (an enum, not a trait object zoo) and registered in a lookup table at
//! startup:
//!
//! - [`EventHandler`] - closed set of per-event-type handlers
//! - [`HandlerRegistry`] - event-type key to handler lookup table
//! - [`TransactionDispatcher`] - batch fan-out over the registry
//!
//! # Wiring
//!
//! ```ignore
//! use facilitator_handlers::{TransactionDispatcher, build_registry};
//!
//! let registry = build_registry(message_repo, request_repo);
//! let dispatcher = TransactionDispatcher::new(registry);
//!
//! // One batch per subgraph poll, keyed by event type
//! let persisted = dispatcher.dispatch(&batch).await?;
//! ```
//!
//! # Transition safety
//!
//! Handlers never move a message status backward: transitions go through
//! the methods on `facilitator_core::models::Message`, which encode the
//! monotonic lattice. Duplicate and out-of-order deliveries are
//! first-class inputs, not errors; replays converge to the same rows.

pub mod redeem_and_unstake;
pub mod stake_and_mint;

mod dispatcher;
mod handler;
mod registry;

pub use dispatcher::TransactionDispatcher;
pub use handler::EventHandler;
pub use registry::{HandlerRegistry, build_registry};

#[cfg(test)]
pub(crate) mod test_support;
