//! Subgraph polling client implementing the event-source port.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use facilitator_core::error::{ChainError, ChainResult};
use facilitator_core::metrics::record_subgraph_poll;
use facilitator_core::ports::{ChainTag, EventBatch, EventBatchStream, EventSource};

use crate::queries::{EntityQuery, entity_queries};

/// Configuration for one subgraph endpoint.
#[derive(Debug, Clone)]
pub struct SubgraphClientConfig {
    /// GraphQL HTTP endpoint
    /// (e.g., "http://localhost:8000/subgraphs/name/mosaic/origin").
    pub endpoint: String,
    /// Which chain this subgraph indexes.
    pub chain: ChainTag,
    /// Delay between polls once the backlog is drained.
    pub poll_interval: Duration,
    /// Maximum records fetched per entity per poll.
    pub page_size: u32,
}

impl SubgraphClientConfig {
    pub fn new(endpoint: impl Into<String>, chain: ChainTag) -> Self {
        Self {
            endpoint: endpoint.into(),
            chain,
            poll_interval: Duration::from_secs(5),
            page_size: 200,
        }
    }
}

/// Subgraph adapter implementing the EventSource port by polling.
///
/// Cursors live in memory and start at zero, so a restarted process replays
/// every record from genesis; handlers absorb the replay by idempotence.
/// Consecutive non-empty polls run back-to-back, draining any backlog at
/// page-size granularity; the poll interval only applies once the subgraph
/// has nothing new.
pub struct SubgraphClient {
    http: reqwest::Client,
    config: SubgraphClientConfig,
}

impl SubgraphClient {
    /// Build a client for one subgraph endpoint.
    pub fn new(config: SubgraphClientConfig) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl EventSource for SubgraphClient {
    fn chain(&self) -> ChainTag {
        self.config.chain
    }

    async fn subscribe(&self) -> ChainResult<EventBatchStream> {
        let state = PollState {
            http: self.http.clone(),
            endpoint: self.config.endpoint.clone(),
            chain: self.config.chain,
            poll_interval: self.config.poll_interval,
            page_size: self.config.page_size,
            queries: entity_queries(self.config.chain),
            cursors: HashMap::new(),
        };

        let stream = futures::stream::unfold(state, |mut state| async move {
            loop {
                match state.poll_once().await {
                    Ok(batch) if batch.entries.is_empty() => {
                        tokio::time::sleep(state.poll_interval).await;
                    }
                    outcome => return Some((outcome, state)),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

// =============================================================================
// Poll loop
// =============================================================================

struct PollState {
    http: reqwest::Client,
    endpoint: String,
    chain: ChainTag,
    poll_interval: Duration,
    page_size: u32,
    queries: Vec<EntityQuery>,
    cursors: HashMap<&'static str, u64>,
}

impl PollState {
    /// Fetch every entity once and assemble the non-empty arrays into one
    /// batch, advancing each entity's cursor past its latest record.
    #[instrument(skip_all, fields(chain = %self.chain))]
    async fn poll_once(&mut self) -> ChainResult<EventBatch> {
        record_subgraph_poll(self.chain.as_str());

        let mut entries = HashMap::new();
        for query in &self.queries {
            let from_block = self.cursors.get(query.entity).copied().unwrap_or(0);
            let records = fetch_entity(
                &self.http,
                &self.endpoint,
                query,
                from_block,
                self.page_size,
            )
            .await?;
            if records.is_empty() {
                continue;
            }

            let highest = records
                .iter()
                .filter_map(record_block_number)
                .max()
                .ok_or_else(|| {
                    ChainError::InvalidResponse(format!(
                        "{} records carry no blockNumber",
                        query.entity
                    ))
                })?;
            self.cursors.insert(query.entity, highest);

            debug!(
                entity = query.entity,
                count = records.len(),
                cursor = highest,
                "Fetched new records"
            );
            entries.insert(query.entity.to_string(), records);
        }

        Ok(EventBatch {
            chain: self.chain,
            entries,
        })
    }
}

/// POST one collection query and return its record array.
async fn fetch_entity(
    http: &reqwest::Client,
    endpoint: &str,
    query: &EntityQuery,
    from_block: u64,
    page_size: u32,
) -> ChainResult<Vec<Value>> {
    let body = serde_json::json!({
        "query": query.document,
        "variables": {
            // BigInt variables travel as strings
            "fromBlock": from_block.to_string(),
            "first": page_size,
        }
    });

    let response = http
        .post(endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ChainError::QueryError(format!(
            "{} returned HTTP {status}",
            query.entity
        )));
    }

    let payload: GraphQlResponse = response
        .json()
        .await
        .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

    extract_records(payload, query.entity)
}

/// Pull the entity's record array out of a decoded GraphQL response.
fn extract_records(response: GraphQlResponse, entity: &str) -> ChainResult<Vec<Value>> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let joined = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ChainError::QueryError(format!("{entity}: {joined}")));
    }

    let mut data = response.data.ok_or_else(|| {
        ChainError::InvalidResponse(format!("{entity}: response carries no data"))
    })?;

    data.remove(entity).ok_or_else(|| {
        ChainError::InvalidResponse(format!("{entity}: collection missing from response"))
    })
}

/// Read a record's block number; Graph nodes serialize BigInt as a string.
fn record_block_number(record: &Value) -> Option<u64> {
    match record.get("blockNumber") {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<HashMap<String, Vec<Value>>>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}
