// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use clap::Parser;
use eventdb_node::config::NodeConfig;
use eventdb_node::ingest::Ingestor;
use eventdb_node::server::{build_router, AppState};
use eventdb_node::store::LogStore;
use eventdb_node::telemetry::Telemetry;
use std::path::PathBuf;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "eventdb-node", version, about = "Append-only event log over HTTP")]
struct Args {
    /// Path to the node's TOML config
    #[arg(default_value = "eventdb.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = NodeConfig::load(&args.config)?;
    let telemetry = Telemetry::init(cfg.server.log_file.as_deref())?;

    tracing::info!("Initializing eventdb node with config: {:?}", cfg);

    let gate = cfg.load_gate()?;
    let store = LogStore::open(&cfg, tracing::info_span!("store"))?;
    let ingest = Ingestor::new(store.clone(), cfg.server.write_mode, tracing::info_span!("ingest"));

    let state = AppState::new(store, gate, ingest.clone()).with_metrics(telemetry.metrics());
    let app = build_router(state, &cfg.server);

    let addr = cfg.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(pending = ingest.in_flight(), "Waiting for acknowledged writes");
    ingest.drain().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
