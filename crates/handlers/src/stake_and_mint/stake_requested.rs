//! Handler for `stakeRequesteds` events.
//!
//! Emitted by the origin composer when a user submits a stake request.
//! Requests live outside the message lifecycle until an acceptance flow
//! graduates them into a declared message.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use facilitator_core::error::DomainResult;
use facilitator_core::models::{
    Address, Entity, MessageTransferRequest, RequestHash, RequestType,
};
use facilitator_core::ports::MessageTransferRequestRepository;

use crate::handler::{decode_record, join_bounded};

// =============================================================================
// Record payload
// =============================================================================

/// Decoded payload of one `StakeRequested` composer event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StakeRequestedRecord {
    stake_request_hash: RequestHash,
    amount: BigDecimal,
    beneficiary: Address,
    gas_price: BigDecimal,
    gas_limit: BigDecimal,
    nonce: BigDecimal,
    gateway: Address,
    staker: Address,
    staker_proxy: Address,
    block_number: BigDecimal,
}

// =============================================================================
// Handler
// =============================================================================

/// Records stake request occurrences.
///
/// A resubmitted request reuses its deterministic hash at a later block,
/// so each record is one occurrence, not necessarily a new request. The
/// handler builds the full occurrence row and hands conflict resolution
/// to the repository: it must not decide the winner from a prior read,
/// because a concurrent save can invalidate that read before the write
/// lands.
#[derive(Clone)]
pub struct StakeRequestedHandler {
    requests: Arc<dyn MessageTransferRequestRepository>,
}

impl StakeRequestedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "stakeRequesteds";

    pub fn new(requests: Arc<dyn MessageTransferRequestRepository>) -> Self {
        Self { requests }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting stake request records");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: StakeRequestedRecord = decode_record(raw, Self::EVENT_TYPE)?;

        let request = MessageTransferRequest {
            request_hash: record.stake_request_hash,
            request_type: RequestType::Stake,
            block_number: record.block_number,
            amount: record.amount,
            beneficiary: record.beneficiary,
            gas_price: record.gas_price,
            gas_limit: record.gas_limit,
            nonce: record.nonce,
            gateway_address: record.gateway,
            sender_address: record.staker,
            sender_proxy_address: record.staker_proxy,
            message_hash: None,
            created_at: None,
            updated_at: None,
        };

        // The returned row may be a newer occurrence that already won the
        // block-height tie-break inside save.
        let persisted = self.requests.save(request).await?;
        Ok(persisted.into())
    }
}
