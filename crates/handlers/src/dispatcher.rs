//! Batch dispatcher.
//!
//! Implements the [`Dispatcher`] port over a [`HandlerRegistry`]: one
//! batch in, one handler invocation per event-type entry, all entries
//! concurrent. Registration is validated for the whole batch before any
//! handler runs, so an unknown event type never leaves a half-dispatched
//! batch behind.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, instrument};

use facilitator_core::error::{DomainError, DomainResult};
use facilitator_core::metrics::{record_entities_persisted, record_handler_error};
use facilitator_core::ports::{Dispatcher, EventBatch};

use crate::handler::join_bounded;
use crate::registry::HandlerRegistry;

// =============================================================================
// Dispatcher
// =============================================================================

/// Dispatches event batches to their registered handlers.
pub struct TransactionDispatcher {
    registry: HandlerRegistry,
}

impl TransactionDispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Run one batch entry through its handler and count the persisted
    /// entities.
    async fn dispatch_entry(&self, event_type: &str, records: &[Value]) -> DomainResult<usize> {
        let handler = self
            .registry
            .get(event_type)
            .ok_or_else(|| DomainError::HandlerNotFound(event_type.to_string()))?;

        match handler.persist(records).await {
            Ok(entities) => {
                record_entities_persisted(event_type, entities.len() as u64);
                debug!(event_type, count = entities.len(), "Batch entry persisted");
                Ok(entities.len())
            }
            Err(e) => {
                record_handler_error(event_type);
                error!(event_type, error = %e, "❌ Batch entry failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Dispatcher for TransactionDispatcher {
    /// Dispatch every entry of the batch and return the total number of
    /// persisted entities.
    ///
    /// All event-type keys are checked against the registry up front; a
    /// single unknown key fails the whole call before any write happens.
    /// Entries then run concurrently and all settle before the first
    /// per-entry failure (in no particular entry order) is reported.
    #[instrument(skip_all, fields(chain = %batch.chain, records = batch.record_count()))]
    async fn dispatch(&self, batch: &EventBatch) -> DomainResult<usize> {
        for event_type in batch.entries.keys() {
            if !self.registry.has_handler(event_type) {
                error!(event_type, "❌ No handler registered for event type");
                return Err(DomainError::HandlerNotFound(event_type.clone()));
            }
        }

        let mut tasks = Vec::with_capacity(batch.entries.len());
        for (event_type, records) in &batch.entries {
            tasks.push(self.dispatch_entry(event_type, records));
        }
        let counts = join_bounded(tasks).await?;

        Ok(counts.into_iter().sum())
    }
}
