//! Core facilitator service - pumps chain events into the dispatcher.
//!
//! One long-lived subscription per chain; each delivered batch is handed to
//! the dispatcher and runs to completion before the next one is taken.
//! Cross-chain ordering is deliberately absent: the transition rules and
//! repository tie-breaks make any interleaving converge.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{FacilitatorError, FacilitatorResult};
use crate::metrics::{DispatchTimer, record_batch_dispatched};
use crate::ports::{Dispatcher, EventBatch, EventSource};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the facilitator service.
#[derive(Debug, Clone)]
pub struct FacilitatorConfig {
    /// Delay before the first resubscription attempt.
    pub initial_retry_delay: Duration,
    /// Upper bound for the exponential resubscription backoff.
    pub max_retry_delay: Duration,
}

impl Default for FacilitatorConfig {
    fn default() -> Self {
        Self {
            initial_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// FacilitatorService
// =============================================================================

/// Main facilitator service.
///
/// # Design
///
/// The service owns one event subscription per chain and runs both pumps
/// concurrently. Each pump resubscribes with exponential backoff when its
/// stream fails; a resubscription replays history from the source, which
/// the idempotent handler/repository core absorbs.
///
/// # Flow
///
/// 1. Subscribe to the origin and auxiliary event sources
/// 2. For each delivered batch, invoke the dispatcher
/// 3. On transient (storage) failure, drop the stream and resubscribe
/// 4. On fatal failure (missing registration, bad payload shape), stop
/// 5. On shutdown signal, stop between dispatches
pub struct FacilitatorService<S: EventSource, D: Dispatcher> {
    config: FacilitatorConfig,
    origin_source: Arc<S>,
    auxiliary_source: Arc<S>,
    dispatcher: Arc<D>,
}

impl<S: EventSource, D: Dispatcher> FacilitatorService<S, D> {
    pub fn new(
        config: FacilitatorConfig,
        origin_source: Arc<S>,
        auxiliary_source: Arc<S>,
        dispatcher: Arc<D>,
    ) -> Self {
        Self {
            config,
            origin_source,
            auxiliary_source,
            dispatcher,
        }
    }

    /// Start the facilitator.
    ///
    /// Runs both chain pumps until shutdown or a fatal error; the first
    /// pump to stop ends the service.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> FacilitatorResult<()> {
        info!("⛓️  Starting facilitator");

        tokio::try_join!(
            self.follow_events(&self.origin_source, shutdown_rx.clone()),
            self.follow_events(&self.auxiliary_source, shutdown_rx),
        )?;

        Ok(())
    }

    /// Follow one chain's event feed, dispatching every delivered batch.
    #[instrument(skip_all, fields(chain = %source.chain()))]
    async fn follow_events(
        &self,
        source: &S,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> FacilitatorResult<()> {
        let chain = source.chain();
        let mut retry_delay = self.config.initial_retry_delay;

        loop {
            if *shutdown_rx.borrow() {
                debug!("Shutdown requested");
                return Err(FacilitatorError::ShutdownRequested);
            }

            match source.subscribe().await {
                Ok(mut stream) => {
                    debug!("📡 Subscription established");
                    retry_delay = self.config.initial_retry_delay; // Reset backoff on success

                    while let Some(result) = stream.next().await {
                        if *shutdown_rx.borrow() {
                            debug!("Shutdown requested");
                            return Err(FacilitatorError::ShutdownRequested);
                        }

                        match result {
                            Ok(batch) => {
                                let records = batch.record_count();
                                match self.dispatch_batch(batch).await {
                                    Ok(persisted) => {
                                        info!(records, persisted, "📦 Batch dispatched");
                                    }
                                    Err(e) if e.is_fatal() => {
                                        error!(error = %e, "❌ Fatal dispatch error, stopping");
                                        return Err(e.into());
                                    }
                                    Err(e) => {
                                        // Transient storage failure: resubscribe and
                                        // let the replay converge.
                                        error!(error = ?e, "❌ Batch dispatch failed, replaying after reconnect");
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                warn!(error = ?e, "⚠️  Subscription error, reconnecting...");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        error = ?e,
                        retry_in_ms = retry_delay.as_millis(),
                        "⚠️  Failed to subscribe, retrying..."
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(retry_delay) => {
                    debug!(chain = %chain, retry_delay_ms = retry_delay.as_millis(), "🔄 Reconnecting to subgraph...");
                    // Exponential backoff: double the delay, up to max
                    retry_delay = (retry_delay * 2).min(self.config.max_retry_delay);
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return Err(FacilitatorError::ShutdownRequested);
                    }
                }
            }
        }
    }

    /// Dispatch a single batch, timing and counting it.
    #[instrument(skip_all, fields(chain = %batch.chain, records = batch.record_count()))]
    async fn dispatch_batch(&self, batch: EventBatch) -> crate::error::DomainResult<usize> {
        let _timer = DispatchTimer::new();
        record_batch_dispatched(batch.chain.as_str());
        self.dispatcher.dispatch(&batch).await
    }
}
