//! Handler for `redeemIntentConfirmeds` events.
//!
//! Emitted by the origin gateway when a declared redeem intent is
//! confirmed there. Target-side declaration of a redeem message.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use facilitator_core::error::DomainResult;
use facilitator_core::models::{
    Address, Entity, Message, MessageDirection, MessageHash, MessageType,
};
use facilitator_core::ports::MessageRepository;

use crate::handler::{decode_record, join_bounded};

// =============================================================================
// Record payload
// =============================================================================

/// Decoded payload of one `RedeemIntentConfirmed` gateway event.
#[derive(Debug, Deserialize)]
struct RedeemIntentConfirmedRecord {
    #[serde(rename = "_messageHash")]
    message_hash: MessageHash,
    #[serde(rename = "_redeemer")]
    redeemer: Address,
    #[serde(rename = "_redeemerNonce")]
    redeemer_nonce: BigDecimal,
    #[serde(rename = "contractAddress")]
    contract_address: Address,
}

// =============================================================================
// Handler
// =============================================================================

/// Marks redeem messages as declared on the origin chain.
#[derive(Clone)]
pub struct RedeemIntentConfirmedHandler {
    messages: Arc<dyn MessageRepository>,
}

impl RedeemIntentConfirmedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "redeemIntentConfirmeds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting redeem intent confirmations");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: RedeemIntentConfirmedRecord = decode_record(raw, Self::EVENT_TYPE)?;

        let mut message = match self.messages.get(&record.message_hash).await? {
            Some(existing) => existing,
            None => {
                debug!(message_hash = %record.message_hash, "Creating a new message");
                let mut created = Message::new(
                    record.message_hash,
                    MessageType::Redeem,
                    MessageDirection::AuxiliaryToOrigin,
                );
                created.sender = Some(record.redeemer);
                created.nonce = Some(record.redeemer_nonce);
                created.gateway_address = Some(record.contract_address);
                created
            }
        };

        if message.declare_target() {
            debug!(message_hash = %message.message_hash, "Target status declared");
        }

        let saved = self.messages.save(message).await?;
        Ok(saved.into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use facilitator_core::models::MessageStatus;

    use super::*;
    use crate::test_support::{InMemoryMessageRepository, message_hash};

    const MESSAGE_HASH: &str =
        "0x7cf0abf2c43f6358be05b33b6464d45e0a5e754b55bc6bdd0dfe166fcc6e1cd5";

    fn confirmed_record() -> Value {
        json!({
            "_messageHash": MESSAGE_HASH,
            "_redeemer": "0x0000000000000000000000000000000000000007",
            "_redeemerNonce": "4",
            "contractAddress": "0x0000000000000000000000000000000000000002",
            "blockNumber": "50",
        })
    }

    #[tokio::test]
    async fn creates_target_declared_redeem_message_when_absent() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let handler = RedeemIntentConfirmedHandler::new(messages.clone());

        handler.persist(&[confirmed_record()]).await.unwrap();

        let saved = messages.row(&message_hash(MESSAGE_HASH)).unwrap();
        assert_eq!(saved.message_type, MessageType::Redeem);
        assert_eq!(saved.direction, MessageDirection::AuxiliaryToOrigin);
        assert_eq!(saved.target_status, MessageStatus::Declared);
        assert_eq!(saved.source_status, MessageStatus::Undeclared);
    }

    #[tokio::test]
    async fn redelivered_confirmation_is_idempotent() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let handler = RedeemIntentConfirmedHandler::new(messages.clone());

        handler.persist(&[confirmed_record()]).await.unwrap();
        let first = messages.row(&message_hash(MESSAGE_HASH)).unwrap();

        handler.persist(&[confirmed_record()]).await.unwrap();
        let second = messages.row(&message_hash(MESSAGE_HASH)).unwrap();

        assert_eq!(first, second);
    }
}
