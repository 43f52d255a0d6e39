//! Port trait for the chain-event source.
//!
//! This trait defines the interface for receiving decoded gateway events
//! from the two chains. Implementations live in the infrastructure layer
//! (e.g., `facilitator-subgraph`). ABI decoding, indexing and connection
//! management all stay behind this boundary: the facilitator core only ever
//! sees event-type-keyed arrays of already-decoded JSON records.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChainResult;

/// Which of the two bridged chains a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainTag {
    Origin,
    Auxiliary,
}

impl ChainTag {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Auxiliary => "auxiliary",
        }
    }
}

impl std::fmt::Display for ChainTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One delivery of decoded event records, keyed by event-type name.
///
/// Each record is a decoded JSON object carrying at minimum the entity's
/// identity field (message hash or request hash), a block number, the
/// event payload and the gateway contract address. No ordering is
/// guaranteed between event types, between batches, or between records.
#[derive(Debug, Clone)]
pub struct EventBatch {
    /// Chain the records were observed on.
    pub chain: ChainTag,
    /// Decoded records grouped by event-type key
    /// (e.g., `stakeRequesteds`, `redeemProgresseds`).
    pub entries: HashMap<String, Vec<serde_json::Value>>,
}

impl EventBatch {
    /// Total number of records across all event types.
    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Stream of event batches from one chain.
pub type EventBatchStream = Pin<Box<dyn Stream<Item = ChainResult<EventBatch>> + Send>>;

/// Port trait for one chain's event feed.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Which chain this source observes.
    fn chain(&self) -> ChainTag;

    /// Open the event stream.
    ///
    /// The stream yields batches until it errors or the source is dropped;
    /// the orchestrator owns reconnection.
    async fn subscribe(&self) -> ChainResult<EventBatchStream>;
}
