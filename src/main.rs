//! Uniscore — Binary Entrypoint
//! Boots the Axum HTTP server: upstream clients, source adapters, routes.
//!
//! See `README.md` for quickstart and endpoint examples.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use uniscore::api::{create_router, AppState};
use uniscore::config::AppConfig;
use uniscore::metrics::Metrics;
use uniscore::sources::justwatch::JustWatchHttp;
use uniscore::sources::letterboxd::{LetterboxdAdapter, LetterboxdHttp};
use uniscore::sources::mubi::{MubiAdapter, MubiHttp};
use uniscore::sources::omdb::{OmdbAdapter, OmdbHttp};
use uniscore::sources::serializd::{SerializdAdapter, SerializdHttp};
use uniscore::sources::tmdb::TmdbHttp;
use uniscore::sources::SourceAdapter;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - UNISCORE_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("UNISCORE_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uniscore=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let config = AppConfig::from_env().expect("load configuration from environment");

    let http = reqwest::Client::new();

    let metadata = Arc::new(TmdbHttp::new(
        http.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_api_key.clone(),
    ));
    let streaming = Arc::new(JustWatchHttp::new(
        http.clone(),
        config.justwatch_graphql_url.clone(),
    ));

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(OmdbAdapter::new(Arc::new(OmdbHttp::new(
            http.clone(),
            config.omdb_base_url.clone(),
            config.omdb_api_key.clone(),
        )))),
        Arc::new(LetterboxdAdapter::new(Arc::new(LetterboxdHttp::new(
            http.clone(),
            config.letterboxd_base_url.clone(),
        )))),
        Arc::new(MubiAdapter::new(Arc::new(MubiHttp::new(
            http.clone(),
            config.mubi_base_url.clone(),
        )))),
        Arc::new(SerializdAdapter::new(Arc::new(SerializdHttp::new(
            http.clone(),
            config.serializd_base_url.clone(),
        )))),
    ];

    let metrics = Metrics::init();

    let state = AppState {
        metadata,
        adapters,
        streaming,
        source_timeout: config.source_timeout,
    };
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
