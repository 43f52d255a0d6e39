//! Handler for `stakeIntentConfirmeds` events.
//!
//! Emitted by the auxiliary co-gateway when a declared stake intent is
//! confirmed there. Target-side declaration of a stake message.

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

/// Decoded payload of one `StakeIntentConfirmed` co-gateway event.
#[derive(Debug, Deserialize)]
struct StakeIntentConfirmedRecord {
    #[serde(rename = "_messageHash")]
    message_hash: MessageHash,
    #[serde(rename = "_staker")]
    staker: Address,
    #[serde(rename = "_stakerNonce")]
    staker_nonce: BigDecimal,
    #[serde(rename = "contractAddress")]
    contract_address: Address,
}

// =============================================================================
// Handler
// =============================================================================

/// Marks stake messages as declared on the auxiliary chain.
///
/// The target side carries no declaration height; everything else follows
/// the same declare rule as the source side, applied to `target_status`.
/// The source status is never touched here, whatever state it is in.
#[derive(Clone)]
pub struct StakeIntentConfirmedHandler {
    messages: Arc<dyn MessageRepository>,
}

impl StakeIntentConfirmedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "stakeIntentConfirmeds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting stake intent confirmations");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: StakeIntentConfirmedRecord = decode_record(raw, Self::EVENT_TYPE)?;

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

        if message.declare_target() {
            debug!(message_hash = %message.message_hash, "Target status declared");
        }

        let saved = self.messages.save(message).await?;
        Ok(saved.into())
    }
}
