//! Message repository implementation for PostgreSQL.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;

use facilitator_core::error::{StorageError, StorageResult};
use facilitator_core::models::{
    Address, HashLock, Message, MessageDirection, MessageHash, MessageStatus, MessageType, Secret,
};
use facilitator_core::ports::MessageRepository;

use super::database::Database;
use super::helpers::{
    bytes_to_hash32, bytes_to_optional_address, bytes_to_optional_hash32, map_sqlx_error,
    unknown_enum_value,
};

/// PostgreSQL implementation of MessageRepository.
///
/// `save` is one upsert statement keyed on the message hash: the whole
/// mutable row is replaced atomically, so concurrent saves of the same hash
/// serialize on the row instead of interleaving columns. The identity
/// columns (message_type, direction, created_at) are never touched on
/// conflict.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn get(&self, message_hash: &MessageHash) -> StorageResult<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT message_hash, message_type, direction, source_status, target_status,
                   sender, nonce, gateway_address, gas_price, gas_limit,
                   source_declaration_block_height, secret, hash_lock,
                   created_at, updated_at
            FROM messages
            WHERE message_hash = $1
            "#,
        )
        .bind(&message_hash.0[..])
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(MessageRow::into_message).transpose()
    }

    async fn save(&self, message: Message) -> StorageResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (
                message_hash, message_type, direction, source_status, target_status,
                sender, nonce, gateway_address, gas_price, gas_limit,
                source_declaration_block_height, secret, hash_lock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (message_hash) DO UPDATE SET
                source_status = EXCLUDED.source_status,
                target_status = EXCLUDED.target_status,
                sender = EXCLUDED.sender,
                nonce = EXCLUDED.nonce,
                gateway_address = EXCLUDED.gateway_address,
                gas_price = EXCLUDED.gas_price,
                gas_limit = EXCLUDED.gas_limit,
                source_declaration_block_height = EXCLUDED.source_declaration_block_height,
                secret = EXCLUDED.secret,
                hash_lock = EXCLUDED.hash_lock,
                updated_at = NOW()
            RETURNING message_hash, message_type, direction, source_status, target_status,
                      sender, nonce, gateway_address, gas_price, gas_limit,
                      source_declaration_block_height, secret, hash_lock,
                      created_at, updated_at
            "#,
        )
        .bind(&message.message_hash.0[..])
        .bind(message.message_type.as_str())
        .bind(message.direction.as_str())
        .bind(message.source_status.as_str())
        .bind(message.target_status.as_str())
        .bind(message.sender.as_ref().map(|a| &a.0[..]))
        .bind(&message.nonce)
        .bind(message.gateway_address.as_ref().map(|a| &a.0[..]))
        .bind(&message.gas_price)
        .bind(&message.gas_limit)
        .bind(&message.source_declaration_block_height)
        .bind(message.secret.as_ref().map(|s| &s.0[..]))
        .bind(message.hash_lock.as_ref().map(|h| &h.0[..]))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.into_message()
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    message_hash: Vec<u8>,
    message_type: String,
    direction: String,
    source_status: String,
    target_status: String,
    sender: Option<Vec<u8>>,
    nonce: Option<BigDecimal>,
    gateway_address: Option<Vec<u8>>,
    gas_price: Option<BigDecimal>,
    gas_limit: Option<BigDecimal>,
    source_declaration_block_height: Option<BigDecimal>,
    secret: Option<Vec<u8>>,
    hash_lock: Option<Vec<u8>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl MessageRow {
    fn into_message(self) -> StorageResult<Message> {
        Ok(Message {
            message_hash: MessageHash(bytes_to_hash32(
                self.message_hash,
                "message.message_hash",
            )?),
            message_type: MessageType::parse(&self.message_type)
                .ok_or_else(|| unknown_enum_value("message.message_type", &self.message_type))?,
            direction: MessageDirection::parse(&self.direction)
                .ok_or_else(|| unknown_enum_value("message.direction", &self.direction))?,
            source_status: MessageStatus::parse(&self.source_status)
                .ok_or_else(|| unknown_enum_value("message.source_status", &self.source_status))?,
            target_status: MessageStatus::parse(&self.target_status)
                .ok_or_else(|| unknown_enum_value("message.target_status", &self.target_status))?,
            sender: bytes_to_optional_address(self.sender, "message.sender")?.map(Address),
            nonce: self.nonce,
            gateway_address: bytes_to_optional_address(
                self.gateway_address,
                "message.gateway_address",
            )?
            .map(Address),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            source_declaration_block_height: self.source_declaration_block_height,
            secret: bytes_to_optional_hash32(self.secret, "message.secret")?.map(Secret),
            hash_lock: bytes_to_optional_hash32(self.hash_lock, "message.hash_lock")?
                .map(HashLock),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn declared_row() -> MessageRow {
        MessageRow {
            message_hash: vec![0x0A; 32],
            message_type: "stake".to_string(),
            direction: "o2a".to_string(),
            source_status: "declared".to_string(),
            target_status: "undeclared".to_string(),
            sender: Some(vec![0x01; 20]),
            nonce: Some(BigDecimal::from(1u32)),
            gateway_address: Some(vec![0x02; 20]),
            gas_price: None,
            gas_limit: None,
            source_declaration_block_height: Some(BigDecimal::from(42u32)),
            secret: None,
            hash_lock: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_message() {
        let message = declared_row().into_message().unwrap();
        assert_eq!(message.message_hash, MessageHash::from([0x0A; 32]));
        assert_eq!(message.message_type, MessageType::Stake);
        assert_eq!(message.direction, MessageDirection::OriginToAuxiliary);
        assert_eq!(message.source_status, MessageStatus::Declared);
        assert_eq!(message.sender, Some(Address::from([0x01; 20])));
        assert_eq!(
            message.source_declaration_block_height,
            Some(BigDecimal::from(42u32))
        );
        assert!(message.secret.is_none());
        assert!(message.created_at.is_some());
    }

    // Test critique: un statut inconnu en base doit échouer à la conversion,
    // jamais être silencieusement remplacé
    #[test]
    fn test_unknown_status_is_a_serialization_error() {
        let mut row = declared_row();
        row.source_status = "minted".to_string();
        match row.into_message() {
            Err(StorageError::SerializationError(msg)) => {
                assert!(msg.contains("message.source_status"));
                assert!(msg.contains("minted"));
            }
            other => panic!("expected SerializationError, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_hash_is_rejected() {
        let mut row = declared_row();
        row.message_hash = vec![0x0A; 16];
        assert!(row.into_message().is_err());
    }
}
