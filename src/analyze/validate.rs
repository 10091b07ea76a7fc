// src/analyze/validate.rs
//! Coercion of untrusted input (Analyzer candidates, manual entries) into [`NewsRecord`]s.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::analyze::ai_adapter::Candidate;
use crate::analyze::image::synthesize_image_url;
use crate::analyze::types::{NewsRecord, NewsType, Sentiment, OTHER_BRAND};
use crate::ingest::types::{new_id, PendingItem};
use crate::ingest::source_of;

pub const SUMMARY_FALLBACK_CHARS: usize = 200;
pub const MAX_TAGS: usize = 10;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Canonical allow-list spelling of `raw`; blank → `Other`; unknown kept as free text.
pub fn normalize_brand(raw: Option<&str>, brands: &[String]) -> String {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return OTHER_BRAND.to_string();
    }
    brands
        .iter()
        .find(|b| b.eq_ignore_ascii_case(raw))
        .cloned()
        .unwrap_or_else(|| raw.to_string())
}

/// Aggregation bucket: anything outside the allow-list counts as `Other`.
pub fn brand_bucket<'a>(brand: &'a str, brands: &'a [String]) -> &'a str {
    brands
        .iter()
        .find(|b| b.eq_ignore_ascii_case(brand))
        .map(String::as_str)
        .unwrap_or(OTHER_BRAND)
}

/// Accept `YYYY-MM-DD`, optionally followed by a time part.
pub fn coerce_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub fn clean_tags(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in raw {
        let t = collapse_ws(&t);
        if t.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(&t)) {
            continue;
        }
        out.push(t);
        if out.len() == MAX_TAGS {
            break;
        }
    }
    out
}

fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").into_owned()
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Caller image if present, otherwise a generated one.
fn resolve_image(
    supplied: Option<String>,
    image_base_url: &str,
    brand: &str,
    title: &str,
    keywords: Option<&str>,
) -> String {
    non_blank(supplied)
        .unwrap_or_else(|| synthesize_image_url(image_base_url, brand, title, keywords))
}

/// Everything needed to turn an Analyzer candidate for `item` into a record.
pub struct Promotion<'a> {
    pub item: &'a PendingItem,
    pub image: Option<String>,
    pub brands: &'a [String],
    pub image_base_url: &'a str,
}

pub fn record_from_candidate(c: &Candidate, p: Promotion<'_>) -> NewsRecord {
    let title = c
        .text("title")
        .map(|t| collapse_ws(&t))
        .unwrap_or_else(|| p.item.title.clone());
    let summary = c
        .text("summary")
        .unwrap_or_else(|| p.item.text.chars().take(SUMMARY_FALLBACK_CHARS).collect());
    let brand = normalize_brand(c.text("brand").as_deref(), p.brands);
    let kind = NewsType::coerce(c.text("type").as_deref());
    let date = coerce_date(c.text("date").as_deref()).unwrap_or(p.item.scraped_at.date_naive());

    let keywords = c.list("image_keywords").join(", ");
    let image = resolve_image(
        p.image,
        p.image_base_url,
        &brand,
        &title,
        Some(keywords.as_str()),
    );

    NewsRecord {
        id: new_id(),
        title,
        summary,
        brand,
        kind,
        date,
        url: p.item.url.clone(),
        source: p.item.source.clone(),
        image,
        sentiment: Sentiment::coerce(c.text("sentiment").as_deref()),
        tags: clean_tags(c.list("tags")),
        created_at: Utc::now(),
    }
}

/// Manual entry payload. Every field except `title` is optional and loosely typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualRecordInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `None` when the title is blank.
pub fn record_from_manual(
    input: ManualRecordInput,
    brands: &[String],
    image_base_url: &str,
) -> Option<NewsRecord> {
    let title = collapse_ws(input.title.as_deref().unwrap_or_default());
    if title.is_empty() {
        return None;
    }
    let brand = normalize_brand(input.brand.as_deref(), brands);
    let url = non_blank(input.url).unwrap_or_default();
    let source = non_blank(input.source)
        .or_else(|| source_of(&url))
        .unwrap_or_default();
    let image = resolve_image(input.image, image_base_url, &brand, &title, None);

    Some(NewsRecord {
        id: new_id(),
        summary: non_blank(input.summary).unwrap_or_default(),
        kind: NewsType::coerce(input.kind.as_deref()),
        date: coerce_date(input.date.as_deref()).unwrap_or_else(|| Utc::now().date_naive()),
        sentiment: Sentiment::coerce(input.sentiment.as_deref()),
        tags: clean_tags(input.tags),
        title,
        brand,
        url,
        source,
        image,
        created_at: Utc::now(),
    })
}
