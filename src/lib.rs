// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod store;

pub use crate::analyze::ai_adapter;
pub use crate::api::{router, AppState};
pub use crate::error::AppError;

use anyhow::Context;
use axum::Router;
use tracing::info;

use crate::analyze::ai_adapter::build_analyzer;
use crate::config::{ai::AiConfig, brands::load_brands_default, AppConfig};

/// Build the application router from environment and `config/` files.
///
/// A missing storage credential or analyzer config does not fail startup; the
/// affected endpoints answer 503 instead.
pub async fn app() -> anyhow::Result<Router> {
    let config = AppConfig::from_env();
    let brands = load_brands_default().context("loading brand allow-list")?;

    let analyzer = match AiConfig::load_default() {
        Ok(cfg) => build_analyzer(&cfg),
        Err(e) => {
            tracing::warn!(error = %e, "AI config invalid; analyzer disabled");
            None
        }
    };

    // Safe diagnostics only: no credentials, no lengths of secrets.
    info!(
        brands = brands.len(),
        storage = config.blob_token.is_some(),
        analyzer = analyzer.as_ref().map(|a| a.provider_name()).unwrap_or("disabled"),
        queue_path = %config.queue_path,
        "app configured"
    );

    let state = AppState::from_config(config, brands, analyzer)?;
    Ok(router(state))
}
