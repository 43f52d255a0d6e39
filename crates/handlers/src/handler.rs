//! Closed handler set and the per-record persistence machinery.
//!
//! Every event type the facilitator subscribes to maps to exactly one
//! variant of [`EventHandler`]. The set is closed on purpose: adding a
//! handler is a source change (new variant, new registration), not a
//! runtime extension point, which keeps dispatch a plain match and lets
//! the registry stay a dumb lookup table.

use std::future::Future;

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use facilitator_core::error::{DomainError, DomainResult};
use facilitator_core::models::Entity;

use crate::redeem_and_unstake::{
    RedeemIntentConfirmedHandler, RedeemIntentDeclaredHandler, RedeemProgressedHandler,
    RedeemRequestedHandler, UnstakeProgressedHandler,
};
use crate::stake_and_mint::{
    MintProgressedHandler, StakeIntentConfirmedHandler, StakeIntentDeclaredHandler,
    StakeProgressedHandler, StakeRequestedHandler,
};

/// Upper bound on concurrently in-flight record saves per batch entry.
pub(crate) const MAX_IN_FLIGHT: usize = 8;

// =============================================================================
// Event handler enum
// =============================================================================

/// One registered event handler.
///
/// Each variant wraps the concrete handler for one subscribed event type
/// and forwards [`persist`](Self::persist) to it. Handlers own nothing but
/// an `Arc` to the repository of the entity they mutate.
#[derive(Clone)]
pub enum EventHandler {
    StakeRequested(StakeRequestedHandler),
    RedeemRequested(RedeemRequestedHandler),
    StakeIntentDeclared(StakeIntentDeclaredHandler),
    RedeemIntentDeclared(RedeemIntentDeclaredHandler),
    StakeProgressed(StakeProgressedHandler),
    RedeemProgressed(RedeemProgressedHandler),
    StakeIntentConfirmed(StakeIntentConfirmedHandler),
    RedeemIntentConfirmed(RedeemIntentConfirmedHandler),
    MintProgressed(MintProgressedHandler),
    UnstakeProgressed(UnstakeProgressedHandler),
}

impl EventHandler {
    /// Event-type key this handler consumes, as it appears in batch
    /// entries and registry lookups.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StakeRequested(_) => StakeRequestedHandler::EVENT_TYPE,
            Self::RedeemRequested(_) => RedeemRequestedHandler::EVENT_TYPE,
            Self::StakeIntentDeclared(_) => StakeIntentDeclaredHandler::EVENT_TYPE,
            Self::RedeemIntentDeclared(_) => RedeemIntentDeclaredHandler::EVENT_TYPE,
            Self::StakeProgressed(_) => StakeProgressedHandler::EVENT_TYPE,
            Self::RedeemProgressed(_) => RedeemProgressedHandler::EVENT_TYPE,
            Self::StakeIntentConfirmed(_) => StakeIntentConfirmedHandler::EVENT_TYPE,
            Self::RedeemIntentConfirmed(_) => RedeemIntentConfirmedHandler::EVENT_TYPE,
            Self::MintProgressed(_) => MintProgressedHandler::EVENT_TYPE,
            Self::UnstakeProgressed(_) => UnstakeProgressedHandler::EVENT_TYPE,
        }
    }

    /// Decode, transition and persist every record of one batch entry.
    ///
    /// Returns the persisted entities in record order. Persistence has
    /// completed for every record by the time this resolves, success or
    /// not; see [`join_bounded`] for the failure contract.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        match self {
            Self::StakeRequested(handler) => handler.persist(records).await,
            Self::RedeemRequested(handler) => handler.persist(records).await,
            Self::StakeIntentDeclared(handler) => handler.persist(records).await,
            Self::RedeemIntentDeclared(handler) => handler.persist(records).await,
            Self::StakeProgressed(handler) => handler.persist(records).await,
            Self::RedeemProgressed(handler) => handler.persist(records).await,
            Self::StakeIntentConfirmed(handler) => handler.persist(records).await,
            Self::RedeemIntentConfirmed(handler) => handler.persist(records).await,
            Self::MintProgressed(handler) => handler.persist(records).await,
            Self::UnstakeProgressed(handler) => handler.persist(records).await,
        }
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EventHandler").field(&self.event_type()).finish()
    }
}

// =============================================================================
// Shared record machinery
// =============================================================================

/// Decode one raw record into the handler's typed payload.
///
/// Malformed input fails that record with a decoding error naming the
/// event type; the payload shape is part of the subscription contract, so
/// a mismatch means the subscribed entity set and the handler disagree.
pub(crate) fn decode_record<T>(raw: &Value, event_type: &str) -> DomainResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(raw.clone())
        .map_err(|error| DomainError::DecodingError(format!("{event_type} record: {error}")))
}

/// Run record futures with bounded concurrency and wait for all of them.
///
/// Every future runs to completion whether or not a sibling fails; the
/// batch result is the collected outputs in input order, or the first
/// failure (in input order) once all futures have settled. Records for
/// the same key racing within a batch are resolved by the repository, not
/// by ordering here.
pub(crate) async fn join_bounded<I, F, T>(tasks: I) -> DomainResult<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = DomainResult<T>>,
{
    let results: Vec<DomainResult<T>> = stream::iter(tasks).buffered(MAX_IN_FLIGHT).collect().await;

    let mut outputs = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(value) => outputs.push(value),
            Err(error) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }

    match first_error {
        None => Ok(outputs),
        Some(error) => Err(error),
    }
}
