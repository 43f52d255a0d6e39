//! Handler for `redeemProgresseds` events.
//!
//! Emitted by the auxiliary co-gateway when a redeem is progressed with
//! the revealed secret. Source-side progress of a redeem message.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use facilitator_core::error::DomainResult;
use facilitator_core::models::{
    Address, Entity, Message, MessageDirection, MessageHash, MessageType, Secret,
};
use facilitator_core::ports::MessageRepository;

use crate::handler::{decode_record, join_bounded};

// =============================================================================
// Record payload
// =============================================================================

/// Decoded payload of one `RedeemProgressed` co-gateway event.
#[derive(Debug, Deserialize)]
struct RedeemProgressedRecord {
    #[serde(rename = "_messageHash")]
    message_hash: MessageHash,
    #[serde(rename = "_redeemer")]
    redeemer: Address,
    #[serde(rename = "_redeemerNonce")]
    redeemer_nonce: BigDecimal,
    #[serde(rename = "_unlockSecret")]
    unlock_secret: Secret,
    #[serde(rename = "contractAddress")]
    contract_address: Address,
}

// =============================================================================
// Handler
// =============================================================================

/// Marks redeem messages as progressed on the auxiliary chain.
///
/// Progress can arrive before the declaration it logically follows (the
/// graph nodes deliver independently); an unseen message is created on
/// the spot and jumps straight to progressed. The secret is recorded on
/// every invocation, progressed or not.
#[derive(Clone)]
pub struct RedeemProgressedHandler {
    messages: Arc<dyn MessageRepository>,
}

impl RedeemProgressedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "redeemProgresseds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting redeem progress records");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: RedeemProgressedRecord = decode_record(raw, Self::EVENT_TYPE)?;

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

        if message.progress_source(record.unlock_secret) {
            debug!(message_hash = %message.message_hash, "Source status progressed");
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
    use crate::redeem_and_unstake::RedeemIntentDeclaredHandler;
    use crate::test_support::{InMemoryMessageRepository, address, message_hash, secret};

    const MESSAGE_HASH: &str =
        "0x59385b6b08e1c545b3d1e7b790cc384e56a1b2ce8e0e326736ca11b0d8f93a51";
    const REDEEMER: &str = "0x0000000000000000000000000000000000000007";
    const COGATEWAY: &str = "0x0000000000000000000000000000000000000006";
    const SECRET: &str =
        "0x8f8b788257c618c2953106cd5d351fd896eec12e0b65c257ed9b967e8bd6e81d";

    fn progressed_record() -> Value {
        json!({
            "_messageHash": MESSAGE_HASH,
            "_redeemer": REDEEMER,
            "_redeemerNonce": "4",
            "_unlockSecret": SECRET,
            "contractAddress": COGATEWAY,
            "blockNumber": "42",
        })
    }

    fn declared_record() -> Value {
        json!({
            "_messageHash": MESSAGE_HASH,
            "_redeemer": REDEEMER,
            "_redeemerNonce": "4",
            "contractAddress": COGATEWAY,
            "blockNumber": "41",
        })
    }

    // Test critique: le progress peut être le premier événement observé
    // pour un message; il est créé directement en Progressed.
    #[tokio::test]
    async fn creates_progressed_message_when_absent() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let handler = RedeemProgressedHandler::new(messages.clone());

        handler.persist(&[progressed_record()]).await.unwrap();

        let saved = messages.row(&message_hash(MESSAGE_HASH)).unwrap();
        assert_eq!(saved.message_type, MessageType::Redeem);
        assert_eq!(saved.direction, MessageDirection::AuxiliaryToOrigin);
        assert_eq!(saved.source_status, MessageStatus::Progressed);
        assert_eq!(saved.secret, Some(secret(SECRET)));
        assert_eq!(saved.sender, Some(address(REDEEMER)));
        assert_eq!(saved.gateway_address, Some(address(COGATEWAY)));
    }

    // Propriété: l'ordre de livraison declare/progress ne change pas
    // l'état final.
    #[tokio::test]
    async fn declare_progress_order_does_not_change_outcome() {
        for progress_first in [false, true] {
            let messages = Arc::new(InMemoryMessageRepository::new());
            let declared = RedeemIntentDeclaredHandler::new(messages.clone());
            let progressed = RedeemProgressedHandler::new(messages.clone());

            if progress_first {
                progressed.persist(&[progressed_record()]).await.unwrap();
                declared.persist(&[declared_record()]).await.unwrap();
            } else {
                declared.persist(&[declared_record()]).await.unwrap();
                progressed.persist(&[progressed_record()]).await.unwrap();
            }

            let saved = messages.row(&message_hash(MESSAGE_HASH)).unwrap();
            assert_eq!(saved.source_status, MessageStatus::Progressed);
            assert_eq!(saved.secret, Some(secret(SECRET)));
        }
    }

    #[tokio::test]
    async fn progresses_declared_message_and_keeps_declaration_height() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let declared = RedeemIntentDeclaredHandler::new(messages.clone());
        let progressed = RedeemProgressedHandler::new(messages.clone());

        declared.persist(&[declared_record()]).await.unwrap();
        progressed.persist(&[progressed_record()]).await.unwrap();

        let saved = messages.row(&message_hash(MESSAGE_HASH)).unwrap();
        assert_eq!(saved.source_status, MessageStatus::Progressed);
        assert_eq!(
            saved.source_declaration_block_height,
            Some(BigDecimal::from(41))
        );
    }
}
