// src/sources/tmdb.rs
//! Authoritative metadata catalog (TMDb). Not a rating source: it is looked
//! up directly by canonical id and supplies the `TitleIdentity` every other
//! adapter consumes. A failure here is fatal to the whole page view.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::identity::{year_from_date, MediaKind, TitleIdentity};

/// Boundary contract for the metadata lookup.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn lookup(&self, kind: MediaKind, catalog_id: &str) -> Result<TitleDetail>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleDetail {
    /// Movies carry `title`, series carry `name`.
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub credits: Option<Credits>,
    #[serde(default)]
    pub created_by: Vec<Person>,
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Person {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
}

impl TitleDetail {
    /// Build the per-view identity. Directors for movies, creators for
    /// series; year from whichever date field the kind carries.
    pub fn into_identity(self, kind: MediaKind, catalog_id: &str) -> Result<TitleIdentity> {
        let title = match kind {
            MediaKind::Movie => self.title,
            MediaKind::Series => self.name,
        }
        .ok_or_else(|| anyhow!("metadata record has no title for {}", kind.as_path()))?;

        let year = match kind {
            MediaKind::Movie => self.release_date.as_deref(),
            MediaKind::Series => self.first_air_date.as_deref(),
        }
        .and_then(year_from_date);

        let people = match kind {
            MediaKind::Movie => self
                .credits
                .unwrap_or_default()
                .crew
                .into_iter()
                .filter(|m| m.job.as_deref() == Some("Director"))
                .map(|m| m.name)
                .collect(),
            MediaKind::Series => self.created_by.into_iter().map(|p| p.name).collect(),
        };

        let imdb_id = self
            .external_ids
            .unwrap_or_default()
            .imdb_id
            .filter(|s| !s.is_empty());

        Ok(TitleIdentity {
            title,
            year,
            kind,
            people,
            catalog_id: catalog_id.to_string(),
            imdb_id,
        })
    }
}

pub struct TmdbHttp {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbHttp {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl MetadataClient for TmdbHttp {
    async fn lookup(&self, kind: MediaKind, catalog_id: &str) -> Result<TitleDetail> {
        let url = format!(
            "{}/{}/{}?api_key={}&append_to_response=credits,external_ids",
            self.base_url,
            kind.as_path(),
            catalog_id,
            self.api_key
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("tmdb http get()")?
            .error_for_status()
            .context("tmdb http status")?;
        resp.json::<TitleDetail>().await.context("tmdb json body")
    }
}
