//! Handler for `unstakeProgresseds` events.
//!
//! Emitted by the origin gateway when the unstake completes with the
//! revealed secret. Target-side progress of a redeem message; the final
//! step of the redeem-and-unstake flow.

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

/// Decoded payload of one `UnstakeProgressed` gateway event.
#[derive(Debug, Deserialize)]
struct UnstakeProgressedRecord {
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

/// Marks redeem messages as progressed on the origin chain.
#[derive(Clone)]
pub struct UnstakeProgressedHandler {
    messages: Arc<dyn MessageRepository>,
}

impl UnstakeProgressedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "unstakeProgresseds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting unstake progress records");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: UnstakeProgressedRecord = decode_record(raw, Self::EVENT_TYPE)?;

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

        if message.progress_target(record.unlock_secret) {
            debug!(message_hash = %message.message_hash, "Target status progressed");
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
    use crate::redeem_and_unstake::RedeemIntentConfirmedHandler;
    use crate::test_support::{InMemoryMessageRepository, message_hash, secret};

    const MESSAGE_HASH: &str =
        "0x90b6fca55d36e7d1c5981dcbaba9ef03c7e97ec26d253a5dfca5b33be7cf6f1b";
    const SECRET: &str =
        "0x3bb5a3a00cbc262c4b5c8be7fd2264b75acab2b292de6fdfd1a98018fab3b0d5";

    fn unstake_record() -> Value {
        json!({
            "_messageHash": MESSAGE_HASH,
            "_redeemer": "0x0000000000000000000000000000000000000007",
            "_redeemerNonce": "4",
            "_unstakeAmount": "25",
            "_unlockSecret": SECRET,
            "contractAddress": "0x0000000000000000000000000000000000000002",
            "blockNumber": "55",
        })
    }

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
    async fn creates_target_progressed_message_when_absent() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let handler = UnstakeProgressedHandler::new(messages.clone());

        handler.persist(&[unstake_record()]).await.unwrap();

        let saved = messages.row(&message_hash(MESSAGE_HASH)).unwrap();
        assert_eq!(saved.target_status, MessageStatus::Progressed);
        assert_eq!(saved.secret, Some(secret(SECRET)));
    }

    #[tokio::test]
    async fn progresses_confirmed_target() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let confirmed = RedeemIntentConfirmedHandler::new(messages.clone());
        let handler = UnstakeProgressedHandler::new(messages.clone());

        confirmed.persist(&[confirmed_record()]).await.unwrap();
        handler.persist(&[unstake_record()]).await.unwrap();

        let saved = messages.row(&message_hash(MESSAGE_HASH)).unwrap();
        assert_eq!(saved.target_status, MessageStatus::Progressed);
        assert_eq!(saved.secret, Some(secret(SECRET)));
    }

    // Test critique: une confirmation arrivant après l'unstake ne fait
    // pas régresser le statut cible.
    #[tokio::test]
    async fn late_confirmation_does_not_regress_target() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let confirmed = RedeemIntentConfirmedHandler::new(messages.clone());
        let handler = UnstakeProgressedHandler::new(messages.clone());

        handler.persist(&[unstake_record()]).await.unwrap();
        confirmed.persist(&[confirmed_record()]).await.unwrap();

        let saved = messages.row(&message_hash(MESSAGE_HASH)).unwrap();
        assert_eq!(saved.target_status, MessageStatus::Progressed);
        assert_eq!(saved.secret, Some(secret(SECRET)));
    }
}
