// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::HeaderName;
use serde::{Deserialize, Serialize};

/// Header carrying the event kind.
pub const EVENT_HEADER: HeaderName = HeaderName::from_static("event");

/// Source and kind the liveness probe writes under.
pub const PING_SOURCE: &str = "server";
pub const PING_KIND: &str = "ping";

/// Error envelope. `/auth` answers with `{"error": null}` on success.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Body of `POST /event` in synchronous write mode.
#[derive(Serialize, Deserialize, Debug)]
pub struct AppendResponse {
    pub id: u64,
}
