// src/sources/serializd.rs
//! Serializd adapter — the series reviews database. Applies to series only;
//! the adapter is never dispatched for movies and its outcome key is absent
//! from the board rather than defaulted to NotFound.
//!
//! Candidates come back from a title search and are resolved through the
//! shared three-tier resolver. Rating values arrive as strings on a 0-5
//! scale (the site embeds schema.org aggregate ratings), so extraction goes
//! through the tolerant string parser.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

use crate::aggregate::{SourceId, SourceOutcome};
use crate::identity::{MediaKind, TitleIdentity};
use crate::rating::{
    normalize, parse_rating_value, parse_sample_size, NormalizedRating, RatingScale, RawRating,
};
use crate::resolve::{resolve, TitleCandidate};
use crate::sources::{SourceAdapter, SourceReport};

#[async_trait]
pub trait ReviewsClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ReviewsCandidate>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewsCandidate {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// Aggregate rating on a 0-5 scale, carried as a string ("4.2", "N/A").
    #[serde(default)]
    pub rating_value: Option<String>,
    #[serde(default)]
    pub rating_count: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl TitleCandidate for ReviewsCandidate {
    fn title(&self) -> &str {
        &self.title
    }
    fn year(&self) -> Option<i32> {
        self.year
    }
}

fn extract(candidate: &ReviewsCandidate) -> Option<RawRating> {
    let value = candidate.rating_value.as_deref().and_then(parse_rating_value)?;
    let sample = candidate.rating_count.as_deref().and_then(parse_sample_size);
    Some(RawRating::new(value, RatingScale::ZeroToFive).with_sample_size(sample))
}

pub struct SerializdAdapter {
    client: Arc<dyn ReviewsClient>,
}

impl SerializdAdapter {
    pub fn new(client: Arc<dyn ReviewsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for SerializdAdapter {
    fn name(&self) -> &'static str {
        "serializd"
    }

    fn sources(&self, identity: &TitleIdentity) -> Vec<SourceId> {
        match identity.kind {
            MediaKind::Series => vec![SourceId::Serializd],
            MediaKind::Movie => Vec::new(),
        }
    }

    async fn fetch(&self, identity: &TitleIdentity) -> Result<Vec<SourceReport>> {
        let candidates = self.client.search(&identity.title).await?;

        let outcome = match resolve(&candidates, identity) {
            Some(show) => match extract(show) {
                Some(raw) => SourceOutcome::Found(NormalizedRating {
                    score: normalize(&raw),
                    link: show.url.clone().or_else(|| {
                        Some(format!(
                            "https://www.serializd.com/show/{}",
                            title_slug(&show.title)
                        ))
                    }),
                }),
                None => SourceOutcome::NotFound,
            },
            None => SourceOutcome::NotFound,
        };

        Ok(vec![SourceReport::new(SourceId::Serializd, outcome)])
    }
}

/// Slug form the site uses in show URLs: lowercase, runs of
/// non-alphanumerics collapsed to single dashes.
pub fn title_slug(title: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    re.replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

pub struct SerializdHttp {
    client: reqwest::Client,
    base_url: String,
}

impl SerializdHttp {
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
    results: Vec<ReviewsCandidate>,
}

#[async_trait]
impl ReviewsClient for SerializdHttp {
    async fn search(&self, query: &str) -> Result<Vec<ReviewsCandidate>> {
        let url = format!(
            "{}/api/search/{}",
            self.base_url,
            urlencoding::encode(query)
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("serializd search get()")?
            .error_for_status()
            .context("serializd search status")?;
        let envelope: SearchEnvelope = resp.json().await.context("serializd search json")?;
        Ok(envelope.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture(Vec<ReviewsCandidate>);

    #[async_trait]
    impl ReviewsClient for Fixture {
        async fn search(&self, _query: &str) -> Result<Vec<ReviewsCandidate>> {
            Ok(self.0.clone())
        }
    }

    fn series(title: &str, year: Option<i32>) -> TitleIdentity {
        TitleIdentity {
            title: title.into(),
            year,
            kind: MediaKind::Series,
            people: vec![],
            catalog_id: "136315".into(),
            imdb_id: None,
        }
    }

    fn candidate(title: &str, year: i32, rating: &str) -> ReviewsCandidate {
        ReviewsCandidate {
            title: title.into(),
            year: Some(year),
            rating_value: Some(rating.into()),
            rating_count: Some("2,410".into()),
            url: Some(format!("https://serializd.test/show/{}", title_slug(title))),
        }
    }

    #[test]
    fn slugs_collapse_punctuation() {
        assert_eq!(title_slug("The Bear"), "the-bear");
        assert_eq!(title_slug("What We Do in the Shadows!"), "what-we-do-in-the-shadows");
    }

    #[test]
    fn movies_are_not_configured() {
        let adapter = SerializdAdapter::new(Arc::new(Fixture(vec![])));
        let mut id = series("The Bear", Some(2022));
        id.kind = MediaKind::Movie;
        assert!(adapter.sources(&id).is_empty());
    }

    #[tokio::test]
    async fn resolves_and_scales_string_rating_by_twenty() {
        let adapter = SerializdAdapter::new(Arc::new(Fixture(vec![
            candidate("The Bear: Extras", 2010, "2.0"),
            candidate("The Bear", 2022, "4.3"),
        ])));
        let reports = adapter.fetch(&series("The Bear", Some(2022))).await.unwrap();
        match &reports[0].outcome {
            SourceOutcome::Found(r) => {
                assert_eq!(r.score, 86);
                assert_eq!(
                    r.link.as_deref(),
                    Some("https://serializd.test/show/the-bear")
                );
            }
            other => panic!("outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_url_falls_back_to_a_slug_link() {
        let mut show = candidate("The Bear", 2022, "4.3");
        show.url = None;
        let adapter = SerializdAdapter::new(Arc::new(Fixture(vec![show])));
        let reports = adapter.fetch(&series("The Bear", Some(2022))).await.unwrap();
        match &reports[0].outcome {
            SourceOutcome::Found(r) => assert_eq!(
                r.link.as_deref(),
                Some("https://www.serializd.com/show/the-bear")
            ),
            other => panic!("outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn na_rating_string_is_not_found() {
        let adapter = SerializdAdapter::new(Arc::new(Fixture(vec![candidate(
            "The Bear",
            2022,
            "N/A",
        )])));
        let reports = adapter.fetch(&series("The Bear", Some(2022))).await.unwrap();
        assert_eq!(reports[0].outcome, SourceOutcome::NotFound);
    }

    #[tokio::test]
    async fn in_production_series_without_year_still_resolves() {
        let adapter = SerializdAdapter::new(Arc::new(Fixture(vec![candidate(
            "The Bear",
            2022,
            "4.0",
        )])));
        let reports = adapter.fetch(&series("The Bear", None)).await.unwrap();
        assert!(matches!(reports[0].outcome, SourceOutcome::Found(_)));
    }
}
