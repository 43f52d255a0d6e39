//! Port trait for the event dispatcher.
//!
//! The orchestration service hands every received [`EventBatch`] to a
//! dispatcher; the concrete implementation (handler registry lookup plus
//! per-type fan-out) lives in `facilitator-handlers`. Keeping the seam here
//! lets the service stay free of handler wiring and lets tests drive the
//! pump with a counting double.

use async_trait::async_trait;

use crate::error::DomainResult;

use super::event_source::EventBatch;

/// Port trait for dispatching one event batch to its handlers.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Dispatch every event-type entry of the batch to its registered
    /// handler and return the number of entities persisted.
    ///
    /// Fails with [`DomainError::HandlerNotFound`], before any handler
    /// runs, when the batch contains an event type with no registration:
    /// a missing registration is a deployment bug, not a transient fault.
    ///
    /// [`DomainError::HandlerNotFound`]: crate::error::DomainError::HandlerNotFound
    async fn dispatch(&self, batch: &EventBatch) -> DomainResult<usize>;
}
