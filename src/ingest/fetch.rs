// src/ingest/fetch.rs
//! Bounded-time page fetch.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use url::Url;

use crate::error::FetchError;
use crate::ingest::types::{PageFetcher, RawPage};

/// Whole-request deadline: connect, headers and body.
pub const FETCH_DEADLINE: Duration = Duration::from_secs(15);

/// Bodies past this size are abandoned; article pages are far smaller.
pub const MAX_PAGE_BYTES: usize = 4 * 1024 * 1024;

/// Desktop browser identification; some news sites block unknown agents outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    deadline: Duration,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_deadline(FETCH_DEADLINE)
    }

    pub fn with_deadline(deadline: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(8))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            http,
            deadline,
            max_bytes: MAX_PAGE_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    async fn get(&self, url: &Url) -> Result<RawPage, FetchError> {
        let mut resp = self
            .http
            .get(url.clone())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9,zh-CN;q=0.8")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let final_url = resp.url().clone();
        if let Some(declared) = resp.content_length() {
            if declared > self.max_bytes as u64 {
                return Err(self.too_large(declared));
            }
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(RawPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    fn too_large(&self, seen: u64) -> FetchError {
        FetchError::Network(format!(
            "page body exceeds {} bytes (at least {seen})",
            self.max_bytes
        ))
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.deadline)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<RawPage, FetchError> {
        let t0 = Instant::now();
        // The deadline is checked first so an expired request is always reported as a timeout.
        let out = match tokio::time::timeout(self.deadline, self.get(url)).await {
            Err(_elapsed) => Err(FetchError::Timeout(self.deadline)),
            Ok(res) => res,
        };
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_fetch_ms").record(ms);

        match &out {
            Ok(page) => tracing::debug!(
                %url, status = page.status, bytes = page.body.len(), elapsed_ms = ms as u64,
                "page fetched"
            ),
            Err(e) => tracing::info!(%url, kind = e.kind(), error = %e, "page fetch failed"),
        }
        out
    }
}
