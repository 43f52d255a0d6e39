//! Off-chain transfer request awaiting on-chain confirmation.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, MessageHash, RequestHash, RequestType};

/// One observed occurrence of a user's stake or redeem request.
///
/// The request hash is deterministic over the request parameters, so a user
/// who resubmits the same logical request produces a new occurrence under
/// the same hash at a later block. The repository keeps exactly one row per
/// hash: the occurrence with the highest block number seen so far. Rows are
/// replaced whole, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTransferRequest {
    /// Deterministic hash of the request parameters.
    pub request_hash: RequestHash,
    /// Stake or redeem.
    pub request_type: RequestType,
    /// Block at which this occurrence was observed.
    pub block_number: BigDecimal,
    /// Token amount to transfer.
    pub amount: BigDecimal,
    /// Receiving account on the target chain.
    pub beneficiary: Address,
    /// Gas price offered for facilitation.
    pub gas_price: BigDecimal,
    /// Gas limit offered for facilitation.
    pub gas_limit: BigDecimal,
    /// Request nonce of the sender on the composer.
    pub nonce: BigDecimal,
    /// Gateway (or co-gateway) contract the request targets.
    pub gateway_address: Address,
    /// Requesting account (staker or redeemer).
    pub sender_address: Address,
    /// Proxy contract acting on the sender's behalf.
    pub sender_proxy_address: Address,
    /// Hash of the confirmed message this request graduated into. Populated
    /// by acceptance flows outside this core; cleared whenever a newer
    /// occurrence supersedes the stored row.
    pub message_hash: Option<MessageHash>,
    /// Row creation time, assigned by storage.
    pub created_at: Option<DateTime<Utc>>,
    /// Last save time, assigned by storage.
    pub updated_at: Option<DateTime<Utc>>,
}

impl MessageTransferRequest {
    /// Tie-break rule between two occurrences of the same request hash:
    /// the incoming row wins when its block number is greater than or equal
    /// to the stored one. Equality replaces so redelivery of the winning
    /// occurrence stays idempotent.
    ///
    /// The Postgres repository enforces the same rule inside its upsert;
    /// this predicate is the single in-process statement of it.
    pub fn supersedes(&self, existing: &MessageTransferRequest) -> bool {
        self.block_number >= existing.block_number
    }
}
