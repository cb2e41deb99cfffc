// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::api::{AppendResponse, ErrorBody, EVENT_HEADER, PING_KIND, PING_SOURCE};
use crate::config::ServerConfig;
use crate::errors::ApiError;
use crate::ingest::{Ingestor, Submission};
use crate::store::LogStore;
use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN},
        request::Parts,
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use eventdb_kernel::{payload, AccessGate, Credentials};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: LogStore,
    pub gate: Arc<AccessGate>,
    pub ingest: Ingestor,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: LogStore, gate: AccessGate, ingest: Ingestor) -> Self {
        Self {
            store,
            gate: Arc::new(gate),
            ingest,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/event", get(get_last_event).post(add_event))
        .route("/auth", get(is_authenticated))
        .route("/ping", get(ping))
        .route("/metrics", get(metrics_handler))
        .layer(cors_layer(&server.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, EVENT_HEADER, CONTENT_TYPE, ORIGIN])
        .expose_headers([CONTENT_LENGTH, AUTHORIZATION, EVENT_HEADER])
        .max_age(Duration::from_secs(12 * 60 * 60));

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let mut exact = Vec::new();
    let mut patterns = Vec::new();
    for origin in origins {
        match origin.split_once('*') {
            Some((prefix, suffix)) => patterns.push((prefix.to_string(), suffix.to_string())),
            None => exact.push(origin.clone()),
        }
    }

    if patterns.is_empty() {
        let allowed: Vec<HeaderValue> = exact
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "Ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        return layer.allow_origin(AllowOrigin::list(allowed)).allow_credentials(true);
    }

    // `https://*.example.com` style entries match any origin with that prefix and suffix.
    let predicate = move |origin: &HeaderValue, _: &Parts| {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        exact.iter().any(|allowed| allowed == origin)
            || patterns.iter().any(|(prefix, suffix)| {
                origin.len() > prefix.len() + suffix.len()
                    && origin.starts_with(prefix.as_str())
                    && origin.ends_with(suffix.as_str())
            })
    };
    layer.allow_origin(AllowOrigin::predicate(predicate)).allow_credentials(true)
}

/// Decodes the caller's credentials; an undecodable token is a missing identity.
fn credentials(headers: &HeaderMap) -> Result<Credentials, ApiError> {
    let creds = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(Credentials::from_authorization)
        .unwrap_or_default();
    if creds.is_empty() {
        return Err(ApiError::MissingIdentity);
    }
    Ok(creds)
}

fn event_kind(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(&EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|kind| !kind.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::MissingEventKind)
}

fn json_payload(bytes: Vec<u8>) -> Response {
    ([(CONTENT_TYPE, "application/json")], bytes).into_response()
}

async fn add_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let creds = credentials(&headers)?;
    let kind = event_kind(&headers)?;
    payload::validate_object(&body)?;
    state.gate.admit(&creds, creds.identity())?;

    let source = creds.identity().to_string();
    tracing::info!(%source, %kind, bytes = body.len(), "Event received");

    match state.ingest.submit(source, kind, body.to_vec()).await? {
        Submission::Scheduled => Ok(StatusCode::CREATED.into_response()),
        Submission::Committed(record) => {
            Ok((StatusCode::CREATED, Json(AppendResponse { id: record.id.0 })).into_response())
        }
    }
}

async fn get_last_event(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let creds = credentials(&headers)?;
    let kind = event_kind(&headers)?;
    state.gate.admit(&creds, creds.identity())?;

    let record = state.store.latest(creds.identity(), &kind).await?;
    tracing::info!(source = creds.identity(), %kind, id = %record.id, "Event requested");
    Ok(json_payload(record.payload))
}

async fn is_authenticated(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<ErrorBody>, ApiError> {
    let creds = credentials(&headers)?;
    state.gate.verify(&creds)?;
    Ok(Json(ErrorBody { error: None }))
}

/// Liveness probe: a full write and read through the store.
async fn ping(State(state): State<AppState>) -> Result<Response, ApiError> {
    let last_ping = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let body = serde_json::json!({ "data": "pong", "last_ping": last_ping });

    state
        .store
        .append(PING_SOURCE, PING_KIND, body.to_string().into_bytes())
        .await?;
    let record = state.store.latest(PING_SOURCE, PING_KIND).await?;
    Ok(json_payload(record.payload))
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    match &state.metrics {
        Some(handle) => handle.render(),
        None => "# metrics not initialized".to_string(),
    }
}
