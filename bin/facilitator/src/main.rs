//! Mosaic facilitator daemon.
//!
//! Wires the hexagon together: two subgraph clients (origin and auxiliary
//! chain) feed decoded gateway events into the facilitator service, which
//! dispatches them through the transaction dispatcher to the per-event-type
//! handlers, which persist state through the PostgreSQL repositories.
//!
//! # Usage
//!
//! ```bash
//! # Start with default config (local graph-node, local postgres)
//! facilitator
//!
//! # Start with environment overrides
//! DATABASE_URL=postgres://localhost/facilitator \
//! ORIGIN_SUBGRAPH_URL=http://graph:8000/subgraphs/name/mosaic/origin \
//! AUXILIARY_SUBGRAPH_URL=http://graph:8000/subgraphs/name/mosaic/auxiliary \
//! facilitator
//!
//! # Apply migrations and exit
//! facilitator --migrate-only
//!
//! # Wipe all facilitated state (keeps schema)
//! facilitator --purge --yes
//! ```

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use facilitator_core::error::FacilitatorError;
use facilitator_core::metrics::init_metrics;
use facilitator_core::ports::{ChainTag, MessageRepository, MessageTransferRequestRepository};
use facilitator_core::services::{FacilitatorConfig, FacilitatorService};
use facilitator_handlers::{TransactionDispatcher, build_registry};
use facilitator_storage::{
    Database, DatabaseConfig, PgMessageRepository, PgMessageTransferRequestRepository,
};
use facilitator_subgraph::{SubgraphClient, SubgraphClientConfig};

/// Facilitator CLI - mosaic cross-chain message facilitator.
#[derive(Parser, Debug)]
#[command(name = "facilitator")]
#[command(about = "Facilitator - reconciles mosaic gateway events into message state")]
#[command(version)]
struct Cli {
    /// GraphQL endpoint of the origin-chain subgraph.
    #[arg(
        long,
        env = "ORIGIN_SUBGRAPH_URL",
        default_value = "http://127.0.0.1:8000/subgraphs/name/mosaic/origin"
    )]
    origin_subgraph: String,

    /// GraphQL endpoint of the auxiliary-chain subgraph.
    #[arg(
        long,
        env = "AUXILIARY_SUBGRAPH_URL",
        default_value = "http://127.0.0.1:8000/subgraphs/name/mosaic/auxiliary"
    )]
    auxiliary_subgraph: String,

    /// PostgreSQL database URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost/facilitator"
    )]
    database_url: String,

    /// Seconds to wait between polls once a subgraph is drained.
    #[arg(long, env = "POLL_INTERVAL", default_value = "5")]
    poll_interval: u64,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Purge all facilitated state from the database and exit.
    ///
    /// Deletes every message and transfer request. The schema and migration
    /// history are preserved; both chains replay from genesis on the next
    /// run and converge back to the same state.
    #[arg(long)]
    purge: bool,

    /// Skip confirmation prompt for destructive operations (like --purge).
    #[arg(long, short = 'y')]
    yes: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                    false
                }
            }
        }
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Mosaic Facilitator");
    debug!(endpoint = %cli.origin_subgraph, "Origin subgraph");
    debug!(endpoint = %cli.auxiliary_subgraph, "Auxiliary subgraph");
    debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ DATABASE
    // ─────────────────────────────────────────────────────────────────────────
    let db_config = DatabaseConfig::for_facilitator(&cli.database_url);

    info!("🗄️  Connecting to database...");
    let db = Database::connect(&db_config)
        .await
        .context("Failed to connect to database")?;

    db.migrate().await.context("Failed to run migrations")?;
    info!("🗄️  Database ready (migrations applied)");

    if cli.migrate_only {
        info!("🛑 --migrate-only flag set, exiting");
        return Ok(());
    }

    if cli.purge {
        return handle_purge(&db, cli.yes).await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 📦 REPOSITORIES + HANDLERS
    // ─────────────────────────────────────────────────────────────────────────
    let messages: Arc<dyn MessageRepository> = Arc::new(PgMessageRepository::new(&db));
    let requests: Arc<dyn MessageTransferRequestRepository> =
        Arc::new(PgMessageTransferRequestRepository::new(&db));

    let registry = build_registry(messages, requests);
    info!(handlers = registry.len(), "📦 Transaction handlers registered");
    let dispatcher = Arc::new(TransactionDispatcher::new(registry));

    // ─────────────────────────────────────────────────────────────────────────
    // 📡 SUBGRAPH CLIENTS
    // ─────────────────────────────────────────────────────────────────────────
    let poll_interval = Duration::from_secs(cli.poll_interval);

    let mut origin_config = SubgraphClientConfig::new(&cli.origin_subgraph, ChainTag::Origin);
    origin_config.poll_interval = poll_interval;
    let origin = Arc::new(
        SubgraphClient::new(origin_config).context("Failed to build origin subgraph client")?,
    );

    let mut auxiliary_config =
        SubgraphClientConfig::new(&cli.auxiliary_subgraph, ChainTag::Auxiliary);
    auxiliary_config.poll_interval = poll_interval;
    let auxiliary = Arc::new(
        SubgraphClient::new(auxiliary_config)
            .context("Failed to build auxiliary subgraph client")?,
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVICES START
    // ─────────────────────────────────────────────────────────────────────────
    let service = FacilitatorService::new(
        FacilitatorConfig::default(),
        origin,
        auxiliary,
        dispatcher,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut service_handle = tokio::spawn(
        async move {
            if let Err(e) = service.run(shutdown_rx).await {
                match &e {
                    FacilitatorError::ShutdownRequested => {}
                    _ => error!(error = %e, "❌ Facilitator error"),
                }
            }
        }
        .instrument(info_span!("facilitator")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Facilitator ready");
    info!("   ⛓️  Origin:     {}", cli.origin_subgraph);
    info!("   ⛓️  Auxiliary:  {}", cli.auxiliary_subgraph);
    if metrics_enabled {
        info!(
            "   📊 Metrics:    http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:    disabled");
    }
    info!("   Press Ctrl+C to stop");

    // The service only stops on its own after a fatal dispatch error
    // (unregistered event type, undecodable payload); treat that as terminal
    // rather than idling with no pumps running.
    let service_stopped = tokio::select! {
        _ = shutdown_signal() => false,
        _ = &mut service_handle => {
            warn!("⚠️  Facilitator stopped on its own, shutting down");
            true
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    let _ = shutdown_tx.send(true);

    if !service_stopped {
        match tokio::time::timeout(std::time::Duration::from_secs(30), &mut service_handle).await {
            Ok(_) => debug!("Facilitator stopped"),
            Err(_) => warn!("⚠️  Facilitator shutdown timed out"),
        }
    }

    db.close().await;

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Handle the --purge command.
async fn handle_purge(db: &Database, skip_confirmation: bool) -> Result<()> {
    warn!("⚠️  PURGE MODE: This will delete ALL facilitated state!");
    warn!("   - All gateway messages");
    warn!("   - All message transfer requests");
    warn!("   - Schema and migrations will be preserved");

    if !skip_confirmation {
        print!("\n🔴 Are you sure you want to purge all data? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            info!("❌ Purge cancelled");
            return Ok(());
        }
    }

    info!("🗑️  Purging database...");

    let stats = db.purge().await.context("Failed to purge database")?;

    info!("✅ Database purged successfully");
    info!("   ✉️  Messages removed: {}", stats.messages_removed);
    info!("   📨 Requests removed: {}", stats.requests_removed);
    info!("   Both chains will replay from genesis on next run");

    Ok(())
}
