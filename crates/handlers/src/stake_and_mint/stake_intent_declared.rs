//! Handler for `stakeIntentDeclareds` events.
//!
//! Emitted by the origin gateway when a stake intent is declared. This is
//! the source-side declaration of a stake message.

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

/// Decoded payload of one `StakeIntentDeclared` gateway event.
#[derive(Debug, Deserialize)]
struct StakeIntentDeclaredRecord {
    #[serde(rename = "_messageHash")]
    message_hash: MessageHash,
    #[serde(rename = "_staker")]
    staker: Address,
    #[serde(rename = "_stakerNonce")]
    staker_nonce: BigDecimal,
    #[serde(rename = "contractAddress")]
    contract_address: Address,
    #[serde(rename = "blockNumber")]
    block_number: BigDecimal,
}

// =============================================================================
// Handler
// =============================================================================

/// Marks stake messages as declared on the origin chain.
///
/// A message observed here for the first time is created on the spot:
/// the two chains' feeds deliver independently, so an absent row only
/// means no other event got there first. Creation-time attributes
/// (sender, nonce, gateway) are filled once and never refreshed.
#[derive(Clone)]
pub struct StakeIntentDeclaredHandler {
    messages: Arc<dyn MessageRepository>,
}

impl StakeIntentDeclaredHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "stakeIntentDeclareds";

    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting stake intent declarations");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: StakeIntentDeclaredRecord = decode_record(raw, Self::EVENT_TYPE)?;

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

        if message.declare_source(record.block_number) {
            debug!(message_hash = %message.message_hash, "Source status declared");
        }

        let saved = self.messages.save(message).await?;
        Ok(saved.into())
    }
}
