// src/store/blob.rs
//! HTTP client for a Vercel-Blob-style object store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CACHE_CONTROL, StatusCode};
use serde::Deserialize;
use url::Url;

use super::BlobStore;
use crate::error::StoreError;

pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
const API_VERSION: &str = "7";

pub struct HttpBlobStore {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ListResp {
    #[serde(default)]
    blobs: Vec<ListedBlob>,
}

#[derive(Deserialize)]
struct ListedBlob {
    url: String,
    pathname: String,
}

#[derive(Deserialize)]
struct PutResp {
    url: String,
}

impl HttpBlobStore {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("auto-news-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| StoreError::Read(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

/// Append a volatile `_t` query parameter so CDN caches never answer the read.
pub fn cache_busted(url: &str, now_millis: i64) -> Result<Url, url::ParseError> {
    let mut u = Url::parse(url)?;
    u.query_pairs_mut()
        .append_pair("_t", &now_millis.to_string());
    Ok(u)
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn locate(&self, pathname: &str) -> Result<Option<String>, StoreError> {
        let resp = self
            .http
            .get(&self.api_url)
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
            .query(&[("prefix", pathname), ("limit", "100")])
            .send()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(StoreError::Read(format!("list HTTP {}", resp.status())));
        }
        let body: ListResp = resp
            .json()
            .await
            .map_err(|e| StoreError::Read(format!("list response: {e}")))?;

        // Prefix listing may also return siblings such as `queue.json.bak`.
        Ok(body
            .blobs
            .into_iter()
            .find(|b| b.pathname == pathname)
            .map(|b| b.url))
    }

    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let target = cache_busted(url, chrono::Utc::now().timestamp_millis())
            .map_err(|e| StoreError::Read(format!("bad blob url {url}: {e}")))?;
        let resp = self
            .http
            .get(target)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|e| StoreError::Read(e.to_string()))?;
                Ok(Some(bytes.to_vec()))
            }
            s => Err(StoreError::Read(format!("fetch HTTP {s}"))),
        }
    }

    async fn put(
        &self,
        pathname: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let resp = self
            .http
            .put(format!("{}/{}", self.api_url, pathname.trim_start_matches('/')))
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .header("x-allow-overwrite", "1")
            .header("x-vercel-blob-access", "public")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(StoreError::Write(format!("put HTTP {}", resp.status())));
        }
        let out: PutResp = resp
            .json()
            .await
            .map_err(|e| StoreError::Write(format!("put response: {e}")))?;
        Ok(out.url)
    }
}
