// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eventdb_kernel::{GateError, KernelError};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing source parameter")]
    MissingIdentity,
    #[error("missing Event header")]
    MissingEventKind,
    #[error("malformed body: {0}")]
    MalformedBody(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingIdentity | ApiError::MissingEventKind | ApiError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::MissingIdentity => ApiError::MissingIdentity,
            GateError::BadCredentials => ApiError::Unauthorized,
            forbidden @ GateError::Forbidden { .. } => ApiError::Forbidden(forbidden.to_string()),
        }
    }
}

impl From<KernelError> for ApiError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::EmptyField("event kind") => ApiError::MissingEventKind,
            KernelError::EmptyField(_) => ApiError::MissingIdentity,
            KernelError::MalformedPayload(msg) => ApiError::MalformedBody(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidKey(k) => k.into(),
            not_found @ StoreError::NotFound { .. } => ApiError::NotFound(not_found.to_string()),
            StoreError::Storage(msg) => ApiError::Storage(msg),
            StoreError::Timeout(d) => ApiError::Timeout(d),
        }
    }
}
