// src/config/mod.rs
pub mod ai;
pub mod brands;

use crate::analyze::image::DEFAULT_IMAGE_GENERATOR_URL;
use crate::store::blob::DEFAULT_BLOB_API_URL;

// --- env names & defaults ---
pub const ENV_BLOB_TOKEN: &str = "BLOB_READ_WRITE_TOKEN";
pub const ENV_BLOB_API_URL: &str = "BLOB_API_URL";
pub const ENV_QUEUE_PATH: &str = "QUEUE_DOCUMENT_PATH";
pub const ENV_RECORDS_PATH: &str = "RECORDS_DOCUMENT_PATH";
pub const ENV_IMAGE_GENERATOR_URL: &str = "IMAGE_GENERATOR_URL";

pub const DEFAULT_QUEUE_PATH: &str = "news/pending-queue.json";
pub const DEFAULT_RECORDS_PATH: &str = "news/records.json";

/// Process configuration read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Object store credential; `None` makes storage-backed endpoints answer 503.
    pub blob_token: Option<String>,
    pub blob_api_url: String,
    pub queue_path: String,
    pub records_path: String,
    pub image_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            blob_token: None,
            blob_api_url: DEFAULT_BLOB_API_URL.to_string(),
            queue_path: DEFAULT_QUEUE_PATH.to_string(),
            records_path: DEFAULT_RECORDS_PATH.to_string(),
            image_base_url: DEFAULT_IMAGE_GENERATOR_URL.to_string(),
        }
    }
}

fn env_non_blank(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            blob_token: env_non_blank(ENV_BLOB_TOKEN),
            blob_api_url: env_non_blank(ENV_BLOB_API_URL).unwrap_or(d.blob_api_url),
            queue_path: env_non_blank(ENV_QUEUE_PATH).unwrap_or(d.queue_path),
            records_path: env_non_blank(ENV_RECORDS_PATH).unwrap_or(d.records_path),
            image_base_url: env_non_blank(ENV_IMAGE_GENERATOR_URL).unwrap_or(d.image_base_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn blank_token_counts_as_missing() {
        std::env::set_var(ENV_BLOB_TOKEN, "   ");
        std::env::remove_var(ENV_QUEUE_PATH);
        let cfg = AppConfig::from_env();
        assert!(cfg.blob_token.is_none());
        assert_eq!(cfg.queue_path, DEFAULT_QUEUE_PATH);

        std::env::set_var(ENV_BLOB_TOKEN, "vercel_blob_rw_x");
        std::env::set_var(ENV_QUEUE_PATH, "custom/q.json");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.blob_token.as_deref(), Some("vercel_blob_rw_x"));
        assert_eq!(cfg.queue_path, "custom/q.json");

        std::env::remove_var(ENV_BLOB_TOKEN);
        std::env::remove_var(ENV_QUEUE_PATH);
    }
}
