//! In-memory repository doubles shared by handler and dispatcher tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use facilitator_core::error::{StorageError, StorageResult};
use facilitator_core::models::{
    Address, Message, MessageHash, MessageTransferRequest, RequestHash, Secret,
};
use facilitator_core::ports::{MessageRepository, MessageTransferRequestRepository};

// =============================================================================
// Hex fixture helpers
// =============================================================================

pub(crate) fn message_hash(hex: &str) -> MessageHash {
    MessageHash::from_hex(hex).unwrap()
}

pub(crate) fn request_hash(hex: &str) -> RequestHash {
    RequestHash::from_hex(hex).unwrap()
}

pub(crate) fn address(hex: &str) -> Address {
    Address::from_hex(hex).unwrap()
}

pub(crate) fn secret(hex: &str) -> Secret {
    Secret::from_hex(hex).unwrap()
}

// =============================================================================
// Message repository double
// =============================================================================

/// Hash-map backed [`MessageRepository`].
#[derive(Default)]
pub(crate) struct InMemoryMessageRepository {
    rows: Mutex<HashMap<MessageHash, Message>>,
}

impl InMemoryMessageRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing `save`.
    pub(crate) fn insert(&self, message: Message) {
        self.rows.lock().unwrap().insert(message.message_hash, message);
    }

    pub(crate) fn row(&self, message_hash: &MessageHash) -> Option<Message> {
        self.rows.lock().unwrap().get(message_hash).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn get(&self, message_hash: &MessageHash) -> StorageResult<Option<Message>> {
        Ok(self.rows.lock().unwrap().get(message_hash).cloned())
    }

    async fn save(&self, message: Message) -> StorageResult<Message> {
        self.rows
            .lock()
            .unwrap()
            .insert(message.message_hash, message.clone());
        Ok(message)
    }
}

/// Repository whose saves always fail; reads still answer absent.
pub(crate) struct FailingMessageRepository;

#[async_trait]
impl MessageRepository for FailingMessageRepository {
    async fn get(&self, _message_hash: &MessageHash) -> StorageResult<Option<Message>> {
        Ok(None)
    }

    async fn save(&self, _message: Message) -> StorageResult<Message> {
        Err(StorageError::QueryError("injected save failure".into()))
    }
}

// =============================================================================
// Transfer request repository double
// =============================================================================

/// Hash-map backed [`MessageTransferRequestRepository`] honouring the same
/// block-height tie-break as the Postgres adapter: an incoming occurrence
/// replaces the stored row only when its block number is greater or equal,
/// and a stale save returns the stored winner untouched.
#[derive(Default)]
pub(crate) struct InMemoryRequestRepository {
    rows: Mutex<HashMap<RequestHash, MessageTransferRequest>>,
}

impl InMemoryRequestRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing `save`.
    pub(crate) fn insert(&self, request: MessageTransferRequest) {
        self.rows.lock().unwrap().insert(request.request_hash, request);
    }

    pub(crate) fn row(&self, request_hash: &RequestHash) -> Option<MessageTransferRequest> {
        self.rows.lock().unwrap().get(request_hash).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageTransferRequestRepository for InMemoryRequestRepository {
    async fn get(
        &self,
        request_hash: &RequestHash,
    ) -> StorageResult<Option<MessageTransferRequest>> {
        Ok(self.rows.lock().unwrap().get(request_hash).cloned())
    }

    async fn save(
        &self,
        request: MessageTransferRequest,
    ) -> StorageResult<MessageTransferRequest> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get(&request.request_hash) {
            Some(existing) if !request.supersedes(existing) => Ok(existing.clone()),
            _ => {
                rows.insert(request.request_hash, request.clone());
                Ok(request)
            }
        }
    }
}
