// src/error.rs
//! Error taxonomy for the ingestion and promotion pipeline.
//!
//! Every stage has its own error type; the HTTP layer only ever sees [`AppError`],
//! which knows its status code and the message shown to the operator.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of the bounded-time page fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::UpstreamStatus { .. } => "upstream_status",
            FetchError::Network(_) => "network",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("insufficient content: {chars} characters extracted (minimum {min})")]
    InsufficientContent { chars: usize, min: usize },
}

/// Remote object-store failures. A missing document is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object store read failed: {0}")]
    Read(String),

    #[error("object store write failed: {0}")]
    Write(String),

    #[error("could not encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures of the external structured-extraction provider.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("provider rejected the credential: {0}")]
    Auth(String),

    #[error("provider response has an unexpected shape: {0}")]
    ParseShape(String),

    #[error("analyzer failed: {0}")]
    Other(String),
}

impl AnalyzerError {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyzerError::Auth(_) => "auth",
            AnalyzerError::ParseShape(_) => "parse_shape",
            AnalyzerError::Other(_) => "other",
        }
    }
}

/// Top-level error surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Fetch(_)
            | AppError::Extract(_)
            | AppError::Store(_)
            | AppError::Analyzer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller in `{"error": ...}`.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(what) => format!("Service not configured: {what}"),
            AppError::Validation(what) => what.clone(),
            AppError::NotFound(what) => what.clone(),
            AppError::Fetch(FetchError::Timeout(d)) => format!(
                "Request timed out: the site did not respond within {} seconds",
                d.as_secs()
            ),
            AppError::Fetch(FetchError::UpstreamStatus { status }) => {
                format!("Failed to fetch page: the site answered HTTP {status}")
            }
            AppError::Fetch(FetchError::Network(e)) => format!("Failed to fetch page: {e}"),
            AppError::Extract(ExtractError::InsufficientContent { .. }) => {
                "No usable content could be extracted from the page (it may be rendered by JavaScript)"
                    .to_string()
            }
            AppError::Store(e) => format!("Storage error: {e}"),
            AppError::Analyzer(AnalyzerError::Auth(_)) => {
                "AI provider rejected the API key; check the analyzer credential".to_string()
            }
            AppError::Analyzer(AnalyzerError::ParseShape(_)) => {
                "AI response could not be parsed into a news record; try again".to_string()
            }
            AppError::Analyzer(AnalyzerError::Other(e)) => format!("AI analysis failed: {e}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}
