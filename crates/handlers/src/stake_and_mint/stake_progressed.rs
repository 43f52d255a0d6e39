//! Handler for `stakeProgresseds` events.
//!
//! Emitted by the origin gateway when a stake is progressed with the
//! revealed hashed-timelock secret. Source-side progress of a stake
//! message.

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

/// Decoded payload of one `StakeProgressed` gateway event.
#[derive(Debug, Deserialize)]
struct StakeProgressedRecord {
    #[serde(rename = "_messageHash")]
    message_hash: MessageHash,
    #[serde(rename = "_staker")]
    staker: Address,
    #[serde(rename = "_stakerNonce")]
    staker_nonce: BigDecimal,
    #[serde(rename = "_unlockSecret")]
    unlock_secret: Secret,
    #[serde(rename = "contractAddress")]
    contract_address: Address,
}

// =============================================================================
// Handler
// =============================================================================

/// Marks stake messages as progressed on the origin chain.
///
/// Progress can legitimately be the first event observed for a message
/// (the feeds race), in which case the message is created and jumps
/// straight to progressed. The secret is recorded unconditionally so a
/// redelivered progress event always leaves the latest revealed secret.
#[derive(Clone)]
pub struct StakeProgressedHandler {
    messages: Arc<dyn MessageRepository>,
}

impl StakeProgressedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "stakeProgresseds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting stake progress records");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: StakeProgressedRecord = decode_record(raw, Self::EVENT_TYPE)?;

        let mut message = match self.messages.get(&record.message_hash).await? {
            Some(existing) => existing,
            None => {
                debug!(message_hash = %record.message_hash, "Creating a new message");
                let mut created = Message::new(
                    record.message_hash,
                    MessageType::Stake,
                    MessageDirection::OriginToAuxiliary,
                );
                created.sender = Some(record.staker);
                created.nonce = Some(record.staker_nonce);
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
