// src/sources/letterboxd.rs
//! Letterboxd adapter. The search endpoint already carries each film's
//! external catalog links, so resolution here is by canonical catalog id
//! rather than the title/year tiers: a candidate matches when any of its
//! links carries the identity's catalog id. Ratings are 0-5.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::aggregate::{SourceId, SourceOutcome};
use crate::identity::TitleIdentity;
use crate::rating::{normalize, NormalizedRating, RatingScale, RawRating};
use crate::sources::{SourceAdapter, SourceReport};

#[async_trait]
pub trait LetterboxdClient: Send + Sync {
    async fn search(&self, title: &str) -> Result<Vec<LetterboxdItem>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct LetterboxdItem {
    pub film: Option<LetterboxdFilm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LetterboxdFilm {
    #[serde(default)]
    pub name: Option<String>,
    /// Average member rating out of five.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub links: Vec<FilmLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilmLink {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

pub struct LetterboxdAdapter {
    client: Arc<dyn LetterboxdClient>,
}

impl LetterboxdAdapter {
    pub fn new(client: Arc<dyn LetterboxdClient>) -> Self {
        Self { client }
    }
}

fn matches_catalog_id(film: &LetterboxdFilm, catalog_id: &str) -> bool {
    film.links
        .iter()
        .any(|l| l.id.as_deref() == Some(catalog_id))
}

#[async_trait]
impl SourceAdapter for LetterboxdAdapter {
    fn name(&self) -> &'static str {
        "letterboxd"
    }

    fn sources(&self, _identity: &TitleIdentity) -> Vec<SourceId> {
        vec![SourceId::Letterboxd]
    }

    async fn fetch(&self, identity: &TitleIdentity) -> Result<Vec<SourceReport>> {
        let items = self.client.search(&identity.title).await?;

        let film = items
            .iter()
            .filter_map(|item| item.film.as_ref())
            .find(|film| matches_catalog_id(film, &identity.catalog_id));

        let outcome = match film.and_then(|f| f.rating.map(|r| (f, r))) {
            Some((film, rating)) => {
                let raw = RawRating::new(rating, RatingScale::ZeroToFive);
                SourceOutcome::Found(NormalizedRating {
                    score: normalize(&raw),
                    link: film.link.clone(),
                })
            }
            // Either nothing matched the catalog id or the matched film
            // structurally lacks a rating. Both are NotFound, not errors.
            None => SourceOutcome::NotFound,
        };

        Ok(vec![SourceReport::new(SourceId::Letterboxd, outcome)])
    }
}

pub struct LetterboxdHttp {
    client: reqwest::Client,
    base_url: String,
}

impl LetterboxdHttp {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    items: Vec<LetterboxdItem>,
}

#[async_trait]
impl LetterboxdClient for LetterboxdHttp {
    async fn search(&self, title: &str) -> Result<Vec<LetterboxdItem>> {
        let url = format!(
            "{}/api/v0/search?input={}",
            self.base_url,
            urlencoding::encode(title)
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("letterboxd http get()")?
            .error_for_status()
            .context("letterboxd http status")?;
        let envelope: SearchEnvelope = resp.json().await.context("letterboxd json body")?;
        Ok(envelope.items)
    }
}
