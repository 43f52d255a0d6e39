//! Port traits for entity repositories.
//!
//! These traits define the storage interface used by the handlers.
//! Implementations live in the infrastructure layer
//! (e.g., `facilitator-storage`).
//!
//! Repositories are the only shared mutable state in the system: every
//! mutation funnels through `save`, and both `save` operations must be safe
//! under concurrent invocation for the same key. Handlers receive their
//! repositories by injection at registry construction; there is no ambient
//! repository state.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{Message, MessageHash, MessageTransferRequest, RequestHash};

/// Repository owning the authoritative copy of every [`Message`].
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Get a message by its hash. Unknown hashes are `Ok(None)`, not errors.
    async fn get(&self, message_hash: &MessageHash) -> StorageResult<Option<Message>>;

    /// Upsert a message by its hash and return the row as persisted.
    ///
    /// The full mutable row is overwritten (last save wins at row level);
    /// status monotonicity is already guaranteed upstream by the transition
    /// methods on [`Message`]. Immutable columns (type, direction, creation
    /// time) are never touched on update.
    async fn save(&self, message: Message) -> StorageResult<Message>;
}

/// Repository owning the authoritative copy of every
/// [`MessageTransferRequest`].
#[async_trait]
pub trait MessageTransferRequestRepository: Send + Sync {
    /// Get a request by its hash. Unknown hashes are `Ok(None)`, not errors.
    async fn get(&self, request_hash: &RequestHash) -> StorageResult<Option<MessageTransferRequest>>;

    /// Upsert a request occurrence and return the persisted winner row.
    ///
    /// Implements the block-height tie-break atomically with respect to
    /// concurrent saves for the same hash: the stored row always reflects
    /// the occurrence with the highest block number, regardless of which
    /// save's I/O completes first. A save superseded by a strictly newer
    /// stored row is a silent no-op returning the stored winner; callers
    /// must not treat their input as persisted without inspecting the
    /// returned row.
    async fn save(&self, request: MessageTransferRequest)
    -> StorageResult<MessageTransferRequest>;
}
