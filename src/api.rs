// src/api.rs
//! HTTP surface. One display endpoint returns the full score report for a
//! title page: identity fields, per-source outcomes, the composite, and the
//! offer buckets for the requested country.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::aggregate::{CompositeScore, SourceId, SourceOutcome};
use crate::identity::MediaKind;
use crate::offers::OfferBuckets;
use crate::sources::justwatch::{fetch_offer_buckets, StreamingClient};
use crate::sources::tmdb::MetadataClient;
use crate::sources::SourceAdapter;
use crate::view::aggregate_ratings;

#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<dyn MetadataClient>,
    pub adapters: Vec<Arc<dyn SourceAdapter>>,
    pub streaming: Arc<dyn StreamingClient>,
    pub source_timeout: Duration,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/title/{kind}/{id}", get(title_report))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct ReportQuery {
    #[serde(default = "default_country")]
    country: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_country() -> String {
    "US".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Serialize)]
struct ScoreReport {
    title: String,
    year: Option<i32>,
    kind: MediaKind,
    uniscore: CompositeScore,
    complete: bool,
    sources: BTreeMap<SourceId, SourceOutcome>,
    offers: OfferBuckets,
}

enum ApiError {
    UnknownKind(String),
    IdentityUnavailable(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::UnknownKind(kind) => (
                StatusCode::BAD_REQUEST,
                format!("unknown media kind '{kind}', expected 'movie' or 'tv'"),
            ),
            ApiError::IdentityUnavailable(e) => {
                tracing::error!(error = %format!("{e:#}"), "identity lookup failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "title metadata is unavailable".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

async fn title_report(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ScoreReport>, ApiError> {
    let kind = MediaKind::from_path(&kind).ok_or(ApiError::UnknownKind(kind))?;

    // Identity is the one hard dependency: without it no source can be
    // queried, so a lookup failure is a real error rather than an outcome.
    let identity = state
        .metadata
        .lookup(kind, &id)
        .await
        .and_then(|detail| detail.into_identity(kind, &id))
        .map_err(ApiError::IdentityUnavailable)?;

    let cancel = CancellationToken::new();
    let ratings = aggregate_ratings(
        &state.adapters,
        &identity,
        state.source_timeout,
        &cancel,
        |_, _| {},
    );
    let offers = async {
        match fetch_offer_buckets(
            state.streaming.as_ref(),
            &identity,
            &query.country,
            &query.language,
        )
        .await
        {
            Ok(buckets) => buckets,
            // Availability is decoration on the score page; a broken offers
            // feed must not take the ratings down with it.
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "offer lookup failed");
                OfferBuckets::default()
            }
        }
    };
    let (board, offers) = tokio::join!(ratings, offers);

    let report = ScoreReport {
        title: identity.title.clone(),
        year: identity.year,
        kind: identity.kind,
        uniscore: board.recompute(),
        complete: board.is_complete(),
        sources: board.outcomes().clone(),
        offers,
    };
    Ok(Json(report))
}
