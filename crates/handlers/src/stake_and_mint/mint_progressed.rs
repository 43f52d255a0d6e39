//! Handler for `mintProgresseds` events.
//!
//! Emitted by the auxiliary co-gateway when the mint completes with the
//! revealed secret. Target-side progress of a stake message; the final
//! step of the stake-and-mint flow.

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

/// Decoded payload of one `MintProgressed` co-gateway event.
#[derive(Debug, Deserialize)]
struct MintProgressedRecord {
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

/// Marks stake messages as progressed on the auxiliary chain.
///
/// Same progress rule as the source side, applied to `target_status`:
/// the mint can be observed before its confirmation, so an absent or
/// merely declared message jumps to progressed, and the secret is always
/// recorded.
#[derive(Clone)]
pub struct MintProgressedHandler {
    messages: Arc<dyn MessageRepository>,
}

impl MintProgressedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "mintProgresseds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting mint progress records");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: MintProgressedRecord = decode_record(raw, Self::EVENT_TYPE)?;

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

        if message.progress_target(record.unlock_secret) {
            debug!(message_hash = %message.message_hash, "Target status progressed");
        }

        let saved = self.messages.save(message).await?;
        Ok(saved.into())
    }
}
