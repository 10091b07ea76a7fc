//! Automotive news ingestion service: binary entrypoint.
//! Boots the Axum HTTP server with tracing and Prometheus metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use auto_news_ingest::metrics::Metrics;

/// Compact logs by default; `INGEST_LOG_FORMAT=json` switches to JSON lines.
/// Uses `try_init` because the hosting runtime may already have installed a subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("auto_news_ingest=info,pipeline=info,warn"));

    let json = std::env::var("INGEST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let mut router = auto_news_ingest::app().await?;

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics disabled"),
    }

    Ok(router.into())
}
