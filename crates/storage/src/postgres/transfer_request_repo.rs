//! Transfer-request repository implementation for PostgreSQL.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use tracing::debug;

use facilitator_core::error::{StorageError, StorageResult};
use facilitator_core::metrics::record_stale_request_discarded;
use facilitator_core::models::{
    Address, MessageHash, MessageTransferRequest, RequestHash, RequestType,
};
use facilitator_core::ports::MessageTransferRequestRepository;

use super::database::Database;
use super::helpers::{
    bytes_to_address, bytes_to_hash32, bytes_to_optional_hash32, map_sqlx_error,
    unknown_enum_value,
};

/// PostgreSQL implementation of MessageTransferRequestRepository.
///
/// The block-height tie-break lives inside the upsert statement itself:
/// `DO UPDATE ... WHERE stored block_number <= EXCLUDED.block_number`. A
/// racing save re-evaluates that condition against whatever row the winning
/// transaction committed, which a read-then-decide in the caller could not
/// guarantee. When the condition rejects the write, the statement returns no
/// row, the save becomes a no-op, and the stored winner is read back and
/// returned.
pub struct PgMessageTransferRequestRepository {
    pool: PgPool,
}

impl PgMessageTransferRequestRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl MessageTransferRequestRepository for PgMessageTransferRequestRepository {
    async fn get(
        &self,
        request_hash: &RequestHash,
    ) -> StorageResult<Option<MessageTransferRequest>> {
        let row = sqlx::query_as::<_, TransferRequestRow>(
            r#"
            SELECT request_hash, request_type, block_number, amount, beneficiary,
                   gas_price, gas_limit, nonce, gateway_address, sender_address,
                   sender_proxy_address, message_hash, created_at, updated_at
            FROM message_transfer_requests
            WHERE request_hash = $1
            "#,
        )
        .bind(&request_hash.0[..])
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(TransferRequestRow::into_request).transpose()
    }

    async fn save(
        &self,
        request: MessageTransferRequest,
    ) -> StorageResult<MessageTransferRequest> {
        let row = sqlx::query_as::<_, TransferRequestRow>(
            r#"
            INSERT INTO message_transfer_requests (
                request_hash, request_type, block_number, amount, beneficiary,
                gas_price, gas_limit, nonce, gateway_address, sender_address,
                sender_proxy_address, message_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (request_hash) DO UPDATE SET
                request_type = EXCLUDED.request_type,
                block_number = EXCLUDED.block_number,
                amount = EXCLUDED.amount,
                beneficiary = EXCLUDED.beneficiary,
                gas_price = EXCLUDED.gas_price,
                gas_limit = EXCLUDED.gas_limit,
                nonce = EXCLUDED.nonce,
                gateway_address = EXCLUDED.gateway_address,
                sender_address = EXCLUDED.sender_address,
                sender_proxy_address = EXCLUDED.sender_proxy_address,
                message_hash = EXCLUDED.message_hash,
                updated_at = NOW()
            WHERE message_transfer_requests.block_number <= EXCLUDED.block_number
            RETURNING request_hash, request_type, block_number, amount, beneficiary,
                      gas_price, gas_limit, nonce, gateway_address, sender_address,
                      sender_proxy_address, message_hash, created_at, updated_at
            "#,
        )
        .bind(&request.request_hash.0[..])
        .bind(request.request_type.as_str())
        .bind(&request.block_number)
        .bind(&request.amount)
        .bind(&request.beneficiary.0[..])
        .bind(&request.gas_price)
        .bind(&request.gas_limit)
        .bind(&request.nonce)
        .bind(&request.gateway_address.0[..])
        .bind(&request.sender_address.0[..])
        .bind(&request.sender_proxy_address.0[..])
        .bind(request.message_hash.as_ref().map(|h| &h.0[..]))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.into_request(),
            None => {
                // The stored occurrence is strictly newer; this one is stale.
                debug!(
                    request_hash = %request.request_hash,
                    block_number = %request.block_number,
                    "Discarding stale transfer-request occurrence"
                );
                record_stale_request_discarded();
                self.get(&request.request_hash).await?.ok_or_else(|| {
                    StorageError::QueryError(format!(
                        "request {} vanished between conditional upsert and read-back",
                        request.request_hash
                    ))
                })
            }
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransferRequestRow {
    request_hash: Vec<u8>,
    request_type: String,
    block_number: BigDecimal,
    amount: BigDecimal,
    beneficiary: Vec<u8>,
    gas_price: BigDecimal,
    gas_limit: BigDecimal,
    nonce: BigDecimal,
    gateway_address: Vec<u8>,
    sender_address: Vec<u8>,
    sender_proxy_address: Vec<u8>,
    message_hash: Option<Vec<u8>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TransferRequestRow {
    fn into_request(self) -> StorageResult<MessageTransferRequest> {
        Ok(MessageTransferRequest {
            request_hash: RequestHash(bytes_to_hash32(
                self.request_hash,
                "request.request_hash",
            )?),
            request_type: RequestType::parse(&self.request_type)
                .ok_or_else(|| unknown_enum_value("request.request_type", &self.request_type))?,
            block_number: self.block_number,
            amount: self.amount,
            beneficiary: Address(bytes_to_address(self.beneficiary, "request.beneficiary")?),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            nonce: self.nonce,
            gateway_address: Address(bytes_to_address(
                self.gateway_address,
                "request.gateway_address",
            )?),
            sender_address: Address(bytes_to_address(
                self.sender_address,
                "request.sender_address",
            )?),
            sender_proxy_address: Address(bytes_to_address(
                self.sender_proxy_address,
                "request.sender_proxy_address",
            )?),
            message_hash: bytes_to_optional_hash32(self.message_hash, "request.message_hash")?
                .map(MessageHash),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stake_request_row() -> TransferRequestRow {
        TransferRequestRow {
            request_hash: vec![0x1B; 32],
            request_type: "stake".to_string(),
            block_number: BigDecimal::from(10u32),
            amount: BigDecimal::from(500u32),
            beneficiary: vec![0x01; 20],
            gas_price: BigDecimal::from(2u32),
            gas_limit: BigDecimal::from(3u32),
            nonce: BigDecimal::from(1u32),
            gateway_address: vec![0x02; 20],
            sender_address: vec![0x03; 20],
            sender_proxy_address: vec![0x04; 20],
            message_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_request() {
        let request = stake_request_row().into_request().unwrap();
        assert_eq!(request.request_hash, RequestHash::from([0x1B; 32]));
        assert_eq!(request.request_type, RequestType::Stake);
        assert_eq!(request.block_number, BigDecimal::from(10u32));
        assert_eq!(request.beneficiary, Address::from([0x01; 20]));
        assert_eq!(request.sender_proxy_address, Address::from([0x04; 20]));
        assert!(request.message_hash.is_none());
        assert!(request.updated_at.is_some());
    }

    #[test]
    fn test_linked_message_hash_is_carried_over() {
        let mut row = stake_request_row();
        row.message_hash = Some(vec![0x2C; 32]);
        let request = row.into_request().unwrap();
        assert_eq!(request.message_hash, Some(MessageHash::from([0x2C; 32])));
    }

    #[test]
    fn test_unknown_request_type_is_rejected() {
        let mut row = stake_request_row();
        row.request_type = "borrow".to_string();
        match row.into_request() {
            Err(StorageError::SerializationError(msg)) => {
                assert!(msg.contains("request.request_type"));
            }
            other => panic!("expected SerializationError, got {other:?}"),
        }
    }
}
