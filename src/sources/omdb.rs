// src/sources/omdb.rs
//! OMDb adapter. One lookup keyed by the identity's IMDb id yields up to
//! three independent rating outcomes: IMDb (0-10 string), Rotten Tomatoes
//! (percent string inside the `Ratings` list) and Metacritic (0-100
//! string). Each outcome stands alone — "N/A" or a missing field turns just
//! that source into `NotFound`, never the whole trio.
//!
//! Not configured at all when the identity carries no IMDb id.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::aggregate::{SourceId, SourceOutcome};
use crate::identity::TitleIdentity;
use crate::rating::{
    normalize, parse_rating_value, parse_sample_size, NormalizedRating, RatingScale, RawRating,
};
use crate::sources::{SourceAdapter, SourceReport};

#[async_trait]
pub trait OmdbClient: Send + Sync {
    async fn by_imdb_id(&self, imdb_id: &str) -> Result<OmdbPayload>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbPayload {
    #[serde(rename = "Response", default)]
    pub response: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes", default)]
    pub imdb_votes: Option<String>,
    #[serde(rename = "Metascore", default)]
    pub metascore: Option<String>,
    #[serde(rename = "Ratings", default)]
    pub ratings: Vec<OmdbRatingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbRatingEntry {
    #[serde(rename = "Source", default)]
    pub source: String,
    #[serde(rename = "Value", default)]
    pub value: String,
}

impl OmdbPayload {
    fn is_found(&self) -> bool {
        self.response == "True"
    }

    fn rotten_tomatoes_value(&self) -> Option<&str> {
        self.ratings
            .iter()
            .find(|r| r.source == "Rotten Tomatoes")
            .map(|r| r.value.as_str())
    }
}

pub struct OmdbAdapter {
    client: Arc<dyn OmdbClient>,
}

impl OmdbAdapter {
    pub fn new(client: Arc<dyn OmdbClient>) -> Self {
        Self { client }
    }

    const SOURCES: [SourceId; 3] = [
        SourceId::Imdb,
        SourceId::RottenTomatoes,
        SourceId::Metacritic,
    ];
}

#[async_trait]
impl SourceAdapter for OmdbAdapter {
    fn name(&self) -> &'static str {
        "omdb"
    }

    fn sources(&self, identity: &TitleIdentity) -> Vec<SourceId> {
        if identity.imdb_id.is_some() {
            Self::SOURCES.to_vec()
        } else {
            Vec::new()
        }
    }

    async fn fetch(&self, identity: &TitleIdentity) -> Result<Vec<SourceReport>> {
        let imdb_id = match identity.imdb_id.as_deref() {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };

        let payload = self.client.by_imdb_id(imdb_id).await?;
        if !payload.is_found() {
            return Ok(Self::SOURCES.map(SourceReport::not_found).to_vec());
        }

        let imdb = payload
            .imdb_rating
            .as_deref()
            .and_then(parse_rating_value)
            .map(|v| {
                RawRating::new(v, RatingScale::ZeroToTen).with_sample_size(
                    payload.imdb_votes.as_deref().and_then(parse_sample_size),
                )
            })
            .map(|raw| NormalizedRating {
                score: normalize(&raw),
                link: Some(format!("https://www.imdb.com/title/{imdb_id}/")),
            });

        let rotten = payload
            .rotten_tomatoes_value()
            .and_then(parse_rating_value)
            .map(|v| RawRating::new(v, RatingScale::Percent))
            .map(|raw| NormalizedRating {
                score: normalize(&raw),
                link: None,
            });

        let metacritic = payload
            .metascore
            .as_deref()
            .and_then(parse_rating_value)
            .map(|v| RawRating::new(v, RatingScale::ZeroToHundred))
            .map(|raw| NormalizedRating {
                score: normalize(&raw),
                link: None,
            });

        let report = |source: SourceId, rating: Option<NormalizedRating>| match rating {
            Some(r) => SourceReport::new(source, SourceOutcome::Found(r)),
            None => SourceReport::not_found(source),
        };

        Ok(vec![
            report(SourceId::Imdb, imdb),
            report(SourceId::RottenTomatoes, rotten),
            report(SourceId::Metacritic, metacritic),
        ])
    }
}

pub struct OmdbHttp {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OmdbHttp {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl OmdbClient for OmdbHttp {
    async fn by_imdb_id(&self, imdb_id: &str) -> Result<OmdbPayload> {
        let url = format!("{}/?apikey={}&i={}", self.base_url, self.api_key, imdb_id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("omdb http get()")?
            .error_for_status()
            .context("omdb http status")?;
        resp.json::<OmdbPayload>().await.context("omdb json body")
    }
}
