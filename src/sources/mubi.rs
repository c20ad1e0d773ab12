// src/sources/mubi.rs
//! Mubi adapter: search, three-tier title resolution, then a second fetch
//! of the matched film's page to pull the rating out of the embedded
//! `__NEXT_DATA__` JSON blob (average out of ten plus rating count).
//!
//! The search endpoint rejects long inputs, so the combined
//! "title director" query falls back to a title-only form capped at
//! `MAX_QUERY_LEN` characters.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::aggregate::{SourceId, SourceOutcome};
use crate::identity::{MediaKind, TitleIdentity};
use crate::rating::{normalize, NormalizedRating, RatingScale, RawRating};
use crate::resolve::{resolve, TitleCandidate};
use crate::sources::{SourceAdapter, SourceReport};

/// Character budget of the upstream search input.
const MAX_QUERY_LEN: usize = 35;

#[async_trait]
pub trait MubiClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<MubiFilm>>;
    /// Raw HTML of a film page; the rating lives in embedded JSON.
    async fn film_page(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct MubiFilm {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub canonical_url: String,
}

impl TitleCandidate for MubiFilm {
    fn title(&self) -> &str {
        &self.title
    }
    fn year(&self) -> Option<i32> {
        self.year
    }
}

/// Movies search as "title director" when a director is known and the
/// combined form fits the budget; everything else (series included) is
/// title-only, truncated to the budget on a char boundary.
pub fn build_query(identity: &TitleIdentity) -> String {
    if identity.kind == MediaKind::Movie {
        if let Some(director) = identity.first_person() {
            let combined = format!("{} {}", identity.title, director);
            if combined.chars().count() <= MAX_QUERY_LEN {
                return combined;
            }
        }
    }
    identity.title.chars().take(MAX_QUERY_LEN).collect()
}

/// Walk `props.initialProps.pageProps.{initFilm|series}` in the embedded
/// page JSON. Any absent level means the page has no rating for us.
fn rating_from_next_data(next_data: &Value) -> Option<RawRating> {
    let page_props = next_data
        .get("props")?
        .get("initialProps")?
        .get("pageProps")?;
    let film = page_props
        .get("initFilm")
        .or_else(|| page_props.get("series"))?;
    let value = film.get("average_rating_out_of_ten")?.as_f64()?;
    let sample = film.get("number_of_ratings").and_then(Value::as_u64);
    Some(RawRating::new(value, RatingScale::ZeroToTen).with_sample_size(sample))
}

/// Pull the `__NEXT_DATA__` script body out of a film page.
fn extract_next_data(html: &str) -> Option<Value> {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse("script#__NEXT_DATA__").ok()?;
    let script = document.select(&selector).next()?;
    let text: String = script.text().collect();
    serde_json::from_str(&text).ok()
}

pub struct MubiAdapter {
    client: Arc<dyn MubiClient>,
}

impl MubiAdapter {
    pub fn new(client: Arc<dyn MubiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for MubiAdapter {
    fn name(&self) -> &'static str {
        "mubi"
    }

    fn sources(&self, _identity: &TitleIdentity) -> Vec<SourceId> {
        vec![SourceId::Mubi]
    }

    async fn fetch(&self, identity: &TitleIdentity) -> Result<Vec<SourceReport>> {
        let query = build_query(identity);
        let candidates = self.client.search(&query).await?;

        let film = match resolve(&candidates, identity) {
            Some(film) => film,
            None => return Ok(vec![SourceReport::not_found(SourceId::Mubi)]),
        };

        let html = self.client.film_page(&film.canonical_url).await?;
        let outcome = match extract_next_data(&html).as_ref().and_then(rating_from_next_data) {
            Some(raw) => SourceOutcome::Found(NormalizedRating {
                score: normalize(&raw),
                link: Some(film.canonical_url.clone()),
            }),
            // Page fetched but the payload lacks a rating — same as no match.
            None => SourceOutcome::NotFound,
        };

        Ok(vec![SourceReport::new(SourceId::Mubi, outcome)])
    }
}

pub struct MubiHttp {
    client: reqwest::Client,
    base_url: String,
}

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

impl MubiHttp {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    search: SearchFilms,
}

#[derive(Debug, Deserialize)]
struct SearchFilms {
    #[serde(default)]
    films: Vec<MubiFilm>,
}

#[async_trait]
impl MubiClient for MubiHttp {
    async fn search(&self, query: &str) -> Result<Vec<MubiFilm>> {
        let url = format!(
            "{}/v3/search?query={}&include_series=true",
            self.base_url,
            urlencoding::encode(query)
        );
        let resp = self
            .client
            .get(&url)
            .header("CLIENT", "web")
            .header("CLIENT_COUNTRY", "us")
            .send()
            .await
            .context("mubi search get()")?
            .error_for_status()
            .context("mubi search status")?;
        let envelope: SearchEnvelope = resp.json().await.context("mubi search json")?;
        Ok(envelope.search.films)
    }

    async fn film_page(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, BROWSER_UA)
            .send()
            .await
            .context("mubi page get()")?
            .error_for_status()
            .context("mubi page status")?;
        resp.text().await.context("mubi page body")
    }
}
