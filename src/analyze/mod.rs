// src/analyze/mod.rs
//! Promotion: queued text → Analyzer → validated record → commit.

pub mod ai_adapter;
pub mod image;
pub mod types;
pub mod validate;

use std::collections::BTreeMap;

use metrics::counter;
use serde::Serialize;

use crate::analyze::ai_adapter::Analyzer;
use crate::analyze::types::NewsRecord;
use crate::analyze::validate::{
    brand_bucket, record_from_candidate, record_from_manual, ManualRecordInput, Promotion,
};
use crate::error::AppError;
use crate::ingest::{ensure_metrics_described, Stage};
use crate::store::{QueueStore, RecordStore};

/// Settings shared by every promotion.
pub struct PromoteCtx<'a> {
    pub brands: &'a [String],
    pub image_base_url: &'a str,
}

/// Promote the queue item `id`. The item stays in the queue whatever the outcome;
/// removal is a separate, explicit call.
pub async fn promote(
    queue: &QueueStore,
    records: &RecordStore,
    analyzer: &dyn Analyzer,
    ctx: PromoteCtx<'_>,
    id: &str,
    image: Option<String>,
) -> Result<NewsRecord, AppError> {
    ensure_metrics_described();
    let item = queue
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pending item '{id}' not found")))?;

    let candidate = match analyzer.analyze(&item.text, ctx.brands).await {
        Ok(c) => c,
        Err(e) => {
            counter!("analyzer_failures_total", "kind" => e.kind()).increment(1);
            tracing::warn!(
                target: "pipeline", %id, provider = analyzer.provider_name(),
                kind = e.kind(), error = %e, "analyzer failed"
            );
            return Err(e.into());
        }
    };
    tracing::info!(target: "pipeline", %id, stage = %Stage::Analyzed, provider = analyzer.provider_name());

    let record = record_from_candidate(
        &candidate,
        Promotion {
            item: &item,
            image,
            brands: ctx.brands,
            image_base_url: ctx.image_base_url,
        },
    );
    records.commit(record.clone()).await?;
    counter!("promotions_total").increment(1);
    Ok(record)
}

/// Create a record from a manual entry.
pub async fn commit_manual(
    records: &RecordStore,
    ctx: PromoteCtx<'_>,
    input: ManualRecordInput,
) -> Result<NewsRecord, AppError> {
    let record = record_from_manual(input, ctx.brands, ctx.image_base_url)
        .ok_or_else(|| AppError::Validation("Missing title".into()))?;
    records.commit(record.clone()).await?;
    Ok(record)
}

/// Counts over committed records, the shape dashboards chart from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub total: usize,
    /// Keyed by allow-list brand; everything else lands under `Other`.
    pub by_brand: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
}

pub fn summarize(records: &[NewsRecord], brands: &[String]) -> RecordSummary {
    let mut out = RecordSummary {
        total: records.len(),
        ..Default::default()
    };
    for r in records {
        *out
            .by_brand
            .entry(brand_bucket(&r.brand, brands).to_string())
            .or_default() += 1;
        *out.by_type.entry(r.kind.as_str().to_string()).or_default() += 1;
    }
    out
}
