// src/api.rs
//! HTTP surface: ingestion, queue management, promotion and records.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::analyze::{self, ai_adapter::DynAnalyzer, validate::ManualRecordInput, PromoteCtx};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::ingest::{self, fetch::HttpFetcher, types::PageFetcher};
use crate::store::{blob::HttpBlobStore, DynBlobStore, QueueStore, RecordStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub fetcher: Arc<dyn PageFetcher>,
    /// `None` when the storage credential is not configured.
    pub blob: Option<DynBlobStore>,
    pub analyzer: Option<DynAnalyzer>,
    pub brands: Arc<Vec<String>>,
}

impl AppState {
    /// Production wiring: real fetcher, HTTP object store when a token is present.
    pub fn from_config(
        config: AppConfig,
        brands: Vec<String>,
        analyzer: Option<DynAnalyzer>,
    ) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new()?;
        let blob: Option<DynBlobStore> = match &config.blob_token {
            Some(token) => Some(Arc::new(HttpBlobStore::new(&config.blob_api_url, token)?)),
            None => {
                tracing::warn!("BLOB_READ_WRITE_TOKEN not set; storage endpoints will answer 503");
                None
            }
        };
        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            blob,
            analyzer,
            brands: Arc::new(brands),
        })
    }

    fn blob(&self) -> Result<DynBlobStore, AppError> {
        self.blob
            .clone()
            .ok_or_else(|| AppError::Config("storage credential is not configured".into()))
    }

    pub fn queue(&self) -> Result<QueueStore, AppError> {
        Ok(QueueStore::new(self.blob()?, &self.config.queue_path))
    }

    pub fn records(&self) -> Result<RecordStore, AppError> {
        Ok(RecordStore::new(self.blob()?, &self.config.records_path))
    }

    fn promote_ctx(&self) -> PromoteCtx<'_> {
        PromoteCtx {
            brands: &self.brands,
            image_base_url: &self.config.image_base_url,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // The ingestion endpoint is called cross-origin by browser tooling.
    let ingest_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    let api_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let ingest_routes = Router::new()
        .route("/api/ingest", post(ingest_handler))
        .layer(ingest_cors);

    let api_routes = Router::new()
        .route("/api/pending", get(list_pending).delete(remove_pending))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/records", get(list_records).post(create_record))
        .route("/api/records/summary", get(records_summary))
        .layer(api_cors);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(ingest_routes)
        .merge(api_routes)
        .with_state(state)
}

fn no_store() -> [(header::HeaderName, HeaderValue); 1] {
    [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))]
}

#[derive(Deserialize)]
struct IngestReq {
    #[serde(default)]
    url: Option<String>,
}

async fn ingest_handler(
    State(state): State<AppState>,
    body: Result<Json<IngestReq>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let queue = state.queue()?;
    let url = body
        .ok()
        .and_then(|Json(b)| b.url)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing url".into()))?;

    let item = ingest::ingest_url(state.fetcher.as_ref(), &queue, &url).await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

async fn list_pending(
    State(state): State<AppState>,
    // `_t` is a client-side cache buster; accepted and ignored.
    Query(_q): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let items = state.queue()?.list_all().await;
    Ok((no_store(), Json(items)))
}

async fn remove_pending(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let queue = state.queue()?;
    let id = q
        .get("id")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Missing id".into()))?;
    let removed = queue.remove(id).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}

#[derive(Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

async fn analyze_handler(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeReq>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let queue = state.queue()?;
    let records = state.records()?;
    let analyzer = state
        .analyzer
        .clone()
        .ok_or_else(|| AppError::Config("AI analyzer is not configured".into()))?;
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let id = req
        .id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing id".into()))?;

    let record = analyze::promote(
        &queue,
        &records,
        analyzer.as_ref(),
        state.promote_ctx(),
        id.trim(),
        req.image,
    )
    .await?;
    Ok(Json(json!({ "success": true, "record": record })))
}

async fn list_records(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let records = state.records()?.list_all().await;
    Ok((no_store(), Json(records)))
}

async fn records_summary(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let records = state.records()?.list_all().await;
    let summary = analyze::summarize(&records, &state.brands);
    Ok((no_store(), Json(summary)))
}

async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<ManualRecordInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let records = state.records()?;
    let Json(input) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let record = analyze::commit_manual(&records, state.promote_ctx(), input).await?;
    Ok(Json(json!({ "success": true, "record": record })))
}
