//! Handler registry.
//!
//! Maps event-type keys to their [`EventHandler`]. The registry is built
//! once at startup from the injected repositories and never mutated
//! afterwards; the dispatcher treats it as a read-only lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use facilitator_core::ports::{MessageRepository, MessageTransferRequestRepository};

use crate::handler::EventHandler;
use crate::redeem_and_unstake::{
    RedeemIntentConfirmedHandler, RedeemIntentDeclaredHandler, RedeemProgressedHandler,
    RedeemRequestedHandler, UnstakeProgressedHandler,
};
use crate::stake_and_mint::{
    MintProgressedHandler, StakeIntentConfirmedHandler, StakeIntentDeclaredHandler,
    StakeProgressedHandler, StakeRequestedHandler,
};

// =============================================================================
// Registry
// =============================================================================

/// Lookup table from event-type key to handler.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, EventHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own event-type key.
    ///
    /// Re-registering a key replaces the previous handler; that only
    /// happens when startup wiring is wrong, so it is logged loudly.
    pub fn register(&mut self, handler: EventHandler) {
        let event_type = handler.event_type();
        if self.handlers.insert(event_type.to_string(), handler).is_some() {
            warn!(event_type, "Replacing an already registered handler");
        } else {
            debug!(event_type, "Handler registered");
        }
    }

    /// Look up the handler for an event-type key.
    pub fn get(&self, event_type: &str) -> Option<&EventHandler> {
        self.handlers.get(event_type)
    }

    /// Whether a handler is registered for this event-type key.
    pub fn has_handler(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Registered event-type keys, sorted for stable logs.
    pub fn registered_event_types(&self) -> Vec<&str> {
        let mut event_types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        event_types.sort_unstable();
        event_types
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Build the full handler set over the two injected repositories.
///
/// Registers every event type of both flow families. This is the single
/// place that decides which event types the facilitator can dispatch;
/// the subscription layer must stay in lockstep with it.
pub fn build_registry(
    messages: Arc<dyn MessageRepository>,
    requests: Arc<dyn MessageTransferRequestRepository>,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    // Stake-and-mint flow (origin to auxiliary)
    registry.register(EventHandler::StakeRequested(StakeRequestedHandler::new(
        Arc::clone(&requests),
    )));
    registry.register(EventHandler::StakeIntentDeclared(
        StakeIntentDeclaredHandler::new(Arc::clone(&messages)),
    ));
    registry.register(EventHandler::StakeProgressed(StakeProgressedHandler::new(
        Arc::clone(&messages),
    )));
    registry.register(EventHandler::StakeIntentConfirmed(
        StakeIntentConfirmedHandler::new(Arc::clone(&messages)),
    ));
    registry.register(EventHandler::MintProgressed(MintProgressedHandler::new(
        Arc::clone(&messages),
    )));

    // Redeem-and-unstake flow (auxiliary to origin)
    registry.register(EventHandler::RedeemRequested(RedeemRequestedHandler::new(
        Arc::clone(&requests),
    )));
    registry.register(EventHandler::RedeemIntentDeclared(
        RedeemIntentDeclaredHandler::new(Arc::clone(&messages)),
    ));
    registry.register(EventHandler::RedeemProgressed(RedeemProgressedHandler::new(
        Arc::clone(&messages),
    )));
    registry.register(EventHandler::RedeemIntentConfirmed(
        RedeemIntentConfirmedHandler::new(Arc::clone(&messages)),
    ));
    registry.register(EventHandler::UnstakeProgressed(UnstakeProgressedHandler::new(
        messages,
    )));

    debug!(
        count = registry.len(),
        event_types = ?registry.registered_event_types(),
        "Handler registry built"
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryMessageRepository, InMemoryRequestRepository};

    fn full_registry() -> HandlerRegistry {
        build_registry(
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(InMemoryRequestRepository::new()),
        )
    }

    #[test]
    fn registers_both_flow_families() {
        let registry = full_registry();

        assert_eq!(registry.len(), 10);
        assert_eq!(
            registry.registered_event_types(),
            vec![
                "mintProgresseds",
                "redeemIntentConfirmeds",
                "redeemIntentDeclareds",
                "redeemProgresseds",
                "redeemRequesteds",
                "stakeIntentConfirmeds",
                "stakeIntentDeclareds",
                "stakeProgresseds",
                "stakeRequesteds",
                "unstakeProgresseds",
            ]
        );
    }

    #[test]
    fn lookup_answers_by_event_type() {
        let registry = full_registry();

        assert!(registry.has_handler("stakeRequesteds"));
        assert!(!registry.has_handler("stakeRequested"));

        let handler = registry.get("redeemProgresseds").unwrap();
        assert_eq!(handler.event_type(), "redeemProgresseds");
        assert!(registry.get("unknownEvents").is_none());
    }

    // Test critique: ré-enregistrer un type remplace le handler au lieu
    // d'en empiler un second.
    #[test]
    fn reregistration_replaces_handler() {
        let messages: Arc<dyn MessageRepository> = Arc::new(InMemoryMessageRepository::new());
        let mut registry = HandlerRegistry::new();

        registry.register(EventHandler::StakeProgressed(StakeProgressedHandler::new(
            Arc::clone(&messages),
        )));
        registry.register(EventHandler::StakeProgressed(StakeProgressedHandler::new(
            messages,
        )));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_registry_has_no_handlers() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.registered_event_types().is_empty());
    }
}
