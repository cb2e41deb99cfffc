// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "eventdb_node=debug,tower_http=debug";

/// Process-wide logging and metrics. Created once by `main` and kept alive
/// until the server stops.
pub struct Telemetry {
    metrics: PrometheusHandle,
}

impl Telemetry {
    /// Installs the tracing subscriber (stdout, plus `log_file` when given) and
    /// the Prometheus recorder.
    pub fn init(log_file: Option<&Path>) -> anyhow::Result<Self> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let file_layer = match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open log file {}", path.display()))?;
                Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .with(file_layer)
            .try_init()
            .context("tracing subscriber already installed")?;

        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        describe_metrics();

        Ok(Self { metrics: handle })
    }

    pub fn metrics(&self) -> PrometheusHandle {
        self.metrics.clone()
    }
}

/// A recorder handle that is not installed globally. Renders an empty page;
/// used where a router is built without `Telemetry`.
pub fn detached_metrics() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn describe_metrics() {
    metrics::describe_counter!("eventdb_appends_total", "Events durably appended");
    metrics::describe_counter!("eventdb_append_failures_total", "Appends that failed or timed out");
    metrics::describe_histogram!("eventdb_append_duration_seconds", "Time from append request to commit");
    metrics::describe_counter!("eventdb_latest_total", "Latest lookups served");
    metrics::describe_counter!("eventdb_latest_not_found_total", "Latest lookups for never-written keys");
    metrics::describe_gauge!("eventdb_head_id", "Greatest event id assigned");

    metrics::gauge!("eventdb_node_up", 1.0);
}
