//! Handler for `redeemIntentDeclareds` events.
//!
//! Emitted by the auxiliary co-gateway when a redeem intent is declared.
//! The redeem flow runs auxiliary to origin, so this is the source-side
//! declaration of a redeem message.

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

/// Decoded payload of one `RedeemIntentDeclared` co-gateway event.
#[derive(Debug, Deserialize)]
struct RedeemIntentDeclaredRecord {
    #[serde(rename = "_messageHash")]
    message_hash: MessageHash,
    #[serde(rename = "_redeemer")]
    redeemer: Address,
    #[serde(rename = "_redeemerNonce")]
    redeemer_nonce: BigDecimal,
    #[serde(rename = "contractAddress")]
    contract_address: Address,
    #[serde(rename = "blockNumber")]
    block_number: BigDecimal,
}

// =============================================================================
// Handler
// =============================================================================

/// Marks redeem messages as declared on the auxiliary chain.
#[derive(Clone)]
pub struct RedeemIntentDeclaredHandler {
    messages: Arc<dyn MessageRepository>,
}

impl RedeemIntentDeclaredHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "redeemIntentDeclareds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting redeem intent declarations");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: RedeemIntentDeclaredRecord = decode_record(raw, Self::EVENT_TYPE)?;

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

        if message.declare_source(record.block_number) {
            debug!(message_hash = %message.message_hash, "Source status declared");
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
    use crate::test_support::{InMemoryMessageRepository, address, message_hash};

    const REDEEMER: &str = "0x0000000000000000000000000000000000000007";

    fn declared_record(message_hash: &str) -> Value {
        json!({
            "_messageHash": message_hash,
            "_redeemer": REDEEMER,
            "_redeemerNonce": "4",
            "_amount": "25",
            "contractAddress": "0x0000000000000000000000000000000000000006",
            "blockNumber": "40",
        })
    }

    #[tokio::test]
    async fn creates_declared_redeem_message_when_absent() {
        let hash = "0x016c04dddd1a6c9dbcd123e9a554664437dd9a5546a3e9cd6cf54df6aa8c5d14";
        let messages = Arc::new(InMemoryMessageRepository::new());
        let handler = RedeemIntentDeclaredHandler::new(messages.clone());

        handler.persist(&[declared_record(hash)]).await.unwrap();

        let saved = messages.row(&message_hash(hash)).unwrap();
        assert_eq!(saved.message_type, MessageType::Redeem);
        assert_eq!(saved.direction, MessageDirection::AuxiliaryToOrigin);
        assert_eq!(saved.source_status, MessageStatus::Declared);
        assert_eq!(saved.sender, Some(address(REDEEMER)));
        assert_eq!(saved.nonce, Some(BigDecimal::from(4)));
        assert_eq!(
            saved.source_declaration_block_height,
            Some(BigDecimal::from(40))
        );
    }

    // Un batch porte souvent plusieurs messages distincts; chacun est
    // traité indépendamment.
    #[tokio::test]
    async fn persists_every_record_of_a_batch() {
        let hashes = [
            "0x1111111111111111111111111111111111111111111111111111111111111111",
            "0x2222222222222222222222222222222222222222222222222222222222222222",
            "0x3333333333333333333333333333333333333333333333333333333333333333",
        ];
        let messages = Arc::new(InMemoryMessageRepository::new());
        let handler = RedeemIntentDeclaredHandler::new(messages.clone());

        let records: Vec<Value> = hashes.iter().map(|h| declared_record(h)).collect();
        let entities = handler.persist(&records).await.unwrap();

        assert_eq!(entities.len(), 3);
        assert_eq!(messages.len(), 3);
        for hash in hashes {
            let saved = messages.row(&message_hash(hash)).unwrap();
            assert_eq!(saved.source_status, MessageStatus::Declared);
        }
    }

    #[tokio::test]
    async fn leaves_progressed_message_untouched() {
        let hash = "0x4444444444444444444444444444444444444444444444444444444444444444";
        let messages = Arc::new(InMemoryMessageRepository::new());
        let mut existing = Message::new(
            message_hash(hash),
            MessageType::Redeem,
            MessageDirection::AuxiliaryToOrigin,
        );
        existing.source_status = MessageStatus::Progressed;
        messages.insert(existing);
        let handler = RedeemIntentDeclaredHandler::new(messages.clone());

        handler.persist(&[declared_record(hash)]).await.unwrap();

        let saved = messages.row(&message_hash(hash)).unwrap();
        assert_eq!(saved.source_status, MessageStatus::Progressed);
        assert_eq!(saved.source_declaration_block_height, None);
    }
}
