// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;

/// A queued, not yet structured article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub text: String,
    pub source: String, // hostname of `url`
    pub scraped_at: DateTime<Utc>,
}

/// Raw response of a successful fetch.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawPage {
    /// Body as text; invalid UTF-8 sequences are replaced.
    pub fn markup(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<RawPage, FetchError>;
}

/// Opaque random token used for queue items and records.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
