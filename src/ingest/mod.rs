// src/ingest/mod.rs
pub mod extract;
pub mod fetch;
pub mod types;

use std::fmt;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use url::Url;

use crate::error::AppError;
use crate::ingest::extract::extract;
use crate::ingest::types::{new_id, PageFetcher, PendingItem};
use crate::store::QueueStore;

/// Lifecycle of one unit of work, from submitted URL to committed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    Fetched,
    Extracted,
    Queued,
    Analyzed,
    Committed,
    Discarded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_requests_total", "URLs submitted for ingestion.");
        describe_counter!(
            "ingest_failures_total",
            "Ingestions that ended before the queue write, by kind."
        );
        describe_counter!("queue_writes_total", "Full overwrites of the queue document.");
        describe_counter!("promotions_total", "Queue items promoted into news records.");
        describe_counter!(
            "analyzer_failures_total",
            "Analyzer calls that failed, by kind."
        );
        describe_histogram!("ingest_fetch_ms", "Page fetch time in milliseconds.");
    });
}

/// Parse a submitted URL; only absolute http(s) URLs are accepted.
pub fn parse_target(raw: &str) -> Result<Url, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("Missing url".into()));
    }
    let url = Url::parse(raw).map_err(|e| AppError::Validation(format!("Invalid url: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        other => Err(AppError::Validation(format!(
            "Invalid url: unsupported scheme '{other}'"
        ))),
    }
}

/// Hostname of `url`, if it parses.
pub fn source_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn fail(kind: &'static str, url: &Url, e: AppError) -> AppError {
    counter!("ingest_failures_total", "kind" => kind).increment(1);
    tracing::info!(target: "pipeline", %url, stage = %Stage::Discarded, kind, error = %e, "ingestion stopped");
    e
}

/// Fetch → extract → append. Nothing is persisted unless every step succeeds.
pub async fn ingest_url(
    fetcher: &dyn PageFetcher,
    queue: &QueueStore,
    raw_url: &str,
) -> Result<PendingItem, AppError> {
    ensure_metrics_described();
    let url = parse_target(raw_url)?;
    counter!("ingest_requests_total").increment(1);
    tracing::info!(target: "pipeline", %url, stage = %Stage::Discovered, "ingestion started");

    let page = match fetcher.fetch(&url).await {
        Ok(p) => p,
        Err(e) => return Err(fail(e.kind(), &url, e.into())),
    };
    tracing::info!(target: "pipeline", %url, stage = %Stage::Fetched, bytes = page.body.len());

    let extracted = match extract(&page.markup()) {
        Ok(x) => x,
        Err(e) => return Err(fail("no_content", &url, e.into())),
    };
    tracing::info!(target: "pipeline", %url, stage = %Stage::Extracted, chars = extracted.text_chars());

    let item = PendingItem {
        id: new_id(),
        source: url.host_str().unwrap_or_default().to_string(),
        // Stored as submitted; the parsed form is only used to fetch and derive the source.
        url: raw_url.trim().to_string(),
        title: extracted.title,
        text: extracted.text,
        scraped_at: Utc::now(),
    };

    if let Err(e) = queue.append(item.clone()).await {
        return Err(fail("store", &url, e.into()));
    }
    tracing::info!(target: "pipeline", %url, id = %item.id, stage = %Stage::Queued);
    Ok(item)
}
