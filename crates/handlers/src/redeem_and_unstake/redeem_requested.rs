//! Handler for `redeemRequesteds` events.
//!
//! Emitted by the auxiliary composer when a user submits a redeem
//! request. Counterpart of the stake request on the other side of the
//! bridge; same occurrence semantics, same tie-break.

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

/// Decoded payload of one `RedeemRequested` composer event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedeemRequestedRecord {
    redeem_request_hash: RequestHash,
    amount: BigDecimal,
    beneficiary: Address,
    gas_price: BigDecimal,
    gas_limit: BigDecimal,
    nonce: BigDecimal,
    cogateway: Address,
    redeemer: Address,
    redeemer_proxy: Address,
    block_number: BigDecimal,
}

// =============================================================================
// Handler
// =============================================================================

/// Records redeem request occurrences.
///
/// Builds the full occurrence row with an empty message link and hands
/// conflict resolution to the repository, exactly like the stake side.
#[derive(Clone)]
pub struct RedeemRequestedHandler {
    requests: Arc<dyn MessageTransferRequestRepository>,
}

impl RedeemRequestedHandler {
    /// Event-type key this handler is registered under.
    pub const EVENT_TYPE: &'static str = "redeemRequesteds";

    pub fn new(requests: Arc<dyn MessageTransferRequestRepository>) -> Self {
        Self { requests }
    }

    /// Persist every record of one batch entry.
    pub async fn persist(&self, records: &[Value]) -> DomainResult<Vec<Entity>> {
        debug!(count = records.len(), "Persisting redeem request records");
        let mut tasks = Vec::with_capacity(records.len());
        for raw in records {
            tasks.push(self.persist_record(raw));
        }
        join_bounded(tasks).await
    }

    async fn persist_record(&self, raw: &Value) -> DomainResult<Entity> {
        let record: RedeemRequestedRecord = decode_record(raw, Self::EVENT_TYPE)?;

        let request = MessageTransferRequest {
            request_hash: record.redeem_request_hash,
            request_type: RequestType::Redeem,
            block_number: record.block_number,
            amount: record.amount,
            beneficiary: record.beneficiary,
            gas_price: record.gas_price,
            gas_limit: record.gas_limit,
            nonce: record.nonce,
            gateway_address: record.cogateway,
            sender_address: record.redeemer,
            sender_proxy_address: record.redeemer_proxy,
            message_hash: None,
            created_at: None,
            updated_at: None,
        };

        let persisted = self.requests.save(request).await?;
        Ok(persisted.into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use facilitator_core::error::DomainError;

    use super::*;
    use crate::test_support::{InMemoryRequestRepository, address, request_hash};

    const REQUEST_HASH: &str =
        "0xb10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6";
    const COGATEWAY: &str = "0x0000000000000000000000000000000000000006";

    fn requested_record(block_number: &str) -> Value {
        json!({
            "id": "1",
            "redeemRequestHash": REQUEST_HASH,
            "amount": "25",
            "beneficiary": "0x0000000000000000000000000000000000000001",
            "gasPrice": "2",
            "gasLimit": "2",
            "nonce": "4",
            "cogateway": COGATEWAY,
            "redeemer": "0x0000000000000000000000000000000000000007",
            "redeemerProxy": "0x0000000000000000000000000000000000000008",
            "blockNumber": block_number,
        })
    }

    #[tokio::test]
    async fn persists_first_occurrence_with_redeem_type() {
        let requests = Arc::new(InMemoryRequestRepository::new());
        let handler = RedeemRequestedHandler::new(requests.clone());

        handler.persist(&[requested_record("30")]).await.unwrap();

        let saved = requests.row(&request_hash(REQUEST_HASH)).unwrap();
        assert_eq!(saved.request_type, RequestType::Redeem);
        assert_eq!(saved.block_number, BigDecimal::from(30));
        assert_eq!(saved.gateway_address, address(COGATEWAY));
        assert_eq!(
            saved.sender_address,
            address("0x0000000000000000000000000000000000000007")
        );
        assert_eq!(saved.message_hash, None);
    }

    #[tokio::test]
    async fn stale_occurrence_is_discarded() {
        let requests = Arc::new(InMemoryRequestRepository::new());
        let handler = RedeemRequestedHandler::new(requests.clone());

        handler.persist(&[requested_record("31")]).await.unwrap();
        handler.persist(&[requested_record("30")]).await.unwrap();

        let saved = requests.row(&request_hash(REQUEST_HASH)).unwrap();
        assert_eq!(saved.block_number, BigDecimal::from(31));
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn record_without_cogateway_fails_to_decode() {
        let requests = Arc::new(InMemoryRequestRepository::new());
        let handler = RedeemRequestedHandler::new(requests.clone());

        let mut record = requested_record("30");
        record.as_object_mut().unwrap().remove("cogateway");

        let result = handler.persist(&[record]).await;
        assert!(matches!(result, Err(DomainError::DecodingError(_))));
        assert_eq!(requests.len(), 0);
    }
}
