// src/sources/justwatch.rs
//! Streaming-availability catalog (JustWatch). Contributes no rating badge;
//! it feeds the stream/rent/buy buckets for the selected country. Search
//! results carry the canonical catalog id, so the match is a plain id
//! comparison over the result list. No match means empty buckets, not an
//! error — the UI renders "no offers available".

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::identity::TitleIdentity;
use crate::offers::{classify, Offer, OfferBuckets, OfferPackage};

#[async_trait]
pub trait StreamingClient: Send + Sync {
    async fn search(
        &self,
        title: &str,
        country: &str,
        language: &str,
        limit: u32,
        best_only: bool,
    ) -> Result<Vec<StreamingCandidate>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingCandidate {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    /// Canonical id in the authoritative catalog, when the catalog knows it.
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

/// How many search results we ask for; the id match makes more pointless.
const SEARCH_LIMIT: u32 = 4;

/// Fetch and classify offers for one identity and country. Absence at any
/// step (no candidates, no id match, no offers) collapses to empty buckets.
pub async fn fetch_offer_buckets(
    client: &dyn StreamingClient,
    identity: &TitleIdentity,
    country: &str,
    language: &str,
) -> Result<OfferBuckets> {
    let results = client
        .search(&identity.title, country, language, SEARCH_LIMIT, true)
        .await?;

    let matched = results
        .into_iter()
        .find(|c| c.catalog_id.as_deref() == Some(identity.catalog_id.as_str()));

    Ok(match matched {
        Some(candidate) => classify(candidate.offers),
        None => OfferBuckets::default(),
    })
}

pub struct JustWatchHttp {
    client: reqwest::Client,
    graphql_url: String,
}

impl JustWatchHttp {
    pub fn new(client: reqwest::Client, graphql_url: impl Into<String>) -> Self {
        Self {
            client,
            graphql_url: graphql_url.into(),
        }
    }
}

/// Trimmed version of the catalog's public GraphQL search: title content,
/// external ids, and the offer list for one country.
const SEARCH_QUERY: &str = r#"
query GetSearchTitles(
  $searchTitlesFilter: TitleFilter!,
  $country: Country!,
  $language: Language!,
  $first: Int!,
  $filter: OfferFilter!,
) {
  popularTitles(country: $country, filter: $searchTitlesFilter, first: $first, sortBy: POPULAR, sortRandomSeed: 0) {
    edges {
      node {
        id
        content(country: $country, language: $language) {
          title
          originalReleaseYear
          externalIds { tmdbId }
        }
        ... on MovieOrShow {
          offers(country: $country, platform: WEB, filter: $filter) {
            monetizationType
            presentationType
            retailPriceValue
            currency
            standardWebURL
            package { clearName icon }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: Option<SearchData>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(rename = "popularTitles")]
    popular_titles: Option<Edges>,
}

#[derive(Debug, Deserialize)]
struct Edges {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Node,
}

#[derive(Debug, Deserialize)]
struct Node {
    id: String,
    content: Option<NodeContent>,
    #[serde(default)]
    offers: Vec<WireOffer>,
}

#[derive(Debug, Deserialize)]
struct NodeContent {
    title: Option<String>,
    #[serde(rename = "originalReleaseYear")]
    original_release_year: Option<i32>,
    #[serde(rename = "externalIds")]
    external_ids: Option<WireExternalIds>,
}

#[derive(Debug, Deserialize)]
struct WireExternalIds {
    #[serde(rename = "tmdbId")]
    tmdb_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireOffer {
    #[serde(rename = "monetizationType")]
    monetization_type: Option<String>,
    #[serde(rename = "presentationType")]
    presentation_type: Option<String>,
    #[serde(rename = "retailPriceValue")]
    retail_price_value: Option<f64>,
    currency: Option<String>,
    #[serde(rename = "standardWebURL")]
    standard_web_url: Option<String>,
    package: Option<WirePackage>,
}

#[derive(Debug, Deserialize)]
struct WirePackage {
    #[serde(rename = "clearName")]
    clear_name: Option<String>,
    icon: Option<String>,
}

impl Node {
    fn into_candidate(self) -> StreamingCandidate {
        let (title, year, catalog_id) = match self.content {
            Some(c) => (
                c.title,
                c.original_release_year,
                // The wire carries the id as either a number or a string.
                c.external_ids.and_then(|e| e.tmdb_id).map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                }),
            ),
            None => (None, None, None),
        };

        let offers = self.offers.into_iter().filter_map(WireOffer::into_offer).collect();

        StreamingCandidate {
            id: self.id,
            title,
            year,
            catalog_id,
            offers,
        }
    }
}

impl WireOffer {
    fn into_offer(self) -> Option<Offer> {
        let package = self.package?;
        Some(Offer {
            package: OfferPackage {
                name: package.clear_name.unwrap_or_default(),
                icon_url: package.icon,
            },
            monetization: serde_json::from_value(json!(self
                .monetization_type
                .unwrap_or_default()))
            .ok()?,
            presentation: serde_json::from_value(json!(self
                .presentation_type
                .unwrap_or_default()))
            .ok()?,
            price_value: self.retail_price_value,
            price_currency: self.currency,
            url: self.standard_web_url,
        })
    }
}

#[async_trait]
impl StreamingClient for JustWatchHttp {
    async fn search(
        &self,
        title: &str,
        country: &str,
        language: &str,
        limit: u32,
        best_only: bool,
    ) -> Result<Vec<StreamingCandidate>> {
        let body = json!({
            "operationName": "GetSearchTitles",
            "query": SEARCH_QUERY,
            "variables": {
                "searchTitlesFilter": { "searchQuery": title },
                "country": country,
                "language": language,
                "first": limit,
                "filter": { "bestOnly": best_only },
            },
        });

        let resp = self
            .client
            .post(&self.graphql_url)
            .json(&body)
            .send()
            .await
            .context("justwatch graphql post()")?
            .error_for_status()
            .context("justwatch graphql status")?;

        let envelope: GraphqlEnvelope = resp.json().await.context("justwatch graphql json")?;
        if !envelope.errors.is_empty() {
            return Err(anyhow!("justwatch graphql errors: {:?}", envelope.errors));
        }

        let edges = envelope
            .data
            .and_then(|d| d.popular_titles)
            .map(|p| p.edges)
            .unwrap_or_default();
        Ok(edges.into_iter().map(|e| e.node.into_candidate()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MediaKind;
    use crate::offers::MonetizationKind;

    struct Fixture(Vec<StreamingCandidate>);

    #[async_trait]
    impl StreamingClient for Fixture {
        async fn search(
            &self,
            _title: &str,
            _country: &str,
            _language: &str,
            _limit: u32,
            _best_only: bool,
        ) -> Result<Vec<StreamingCandidate>> {
            Ok(self.0.clone())
        }
    }

    fn identity(catalog_id: &str) -> TitleIdentity {
        TitleIdentity {
            title: "Dune".into(),
            year: Some(2021),
            kind: MediaKind::Movie,
            people: vec![],
            catalog_id: catalog_id.into(),
            imdb_id: None,
        }
    }

    fn candidate(catalog_id: &str, offers_json: serde_json::Value) -> StreamingCandidate {
        StreamingCandidate {
            id: "tm100".into(),
            title: Some("Dune".into()),
            year: Some(2021),
            catalog_id: Some(catalog_id.into()),
            offers: serde_json::from_value(offers_json).unwrap(),
        }
    }

    fn offer_json(name: &str, kind: &str) -> serde_json::Value {
        serde_json::json!({
            "package": { "name": name },
            "monetization": kind,
            "presentation": "HD"
        })
    }

    #[tokio::test]
    async fn id_match_classifies_offers() {
        let fixture = Fixture(vec![
            candidate("999", serde_json::json!([offer_json("Max", "FLATRATE")])),
            candidate(
                "438631",
                serde_json::json!([
                    offer_json("Netflix", "FLATRATE"),
                    offer_json("Apple TV", "FLATRATE"),
                    offer_json("Amazon Video", "RENT"),
                ]),
            ),
        ]);
        let buckets = fetch_offer_buckets(&fixture, &identity("438631"), "US", "en")
            .await
            .unwrap();
        let stream: Vec<&str> = buckets.stream.iter().map(|o| o.package.name.as_str()).collect();
        assert_eq!(stream, vec!["Apple TV", "Netflix"]);
        assert_eq!(buckets.rent.len(), 1);
        assert!(buckets.buy.is_empty());
    }

    #[tokio::test]
    async fn no_id_match_yields_empty_buckets() {
        let fixture = Fixture(vec![candidate("999", serde_json::json!([]))]);
        let buckets = fetch_offer_buckets(&fixture, &identity("438631"), "US", "en")
            .await
            .unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn wire_node_maps_to_candidate() {
        let node: Node = serde_json::from_value(serde_json::json!({
            "id": "tm92641",
            "content": {
                "title": "Dune",
                "originalReleaseYear": 2021,
                "externalIds": { "tmdbId": 438631 }
            },
            "offers": [{
                "monetizationType": "RENT",
                "presentationType": "_4K",
                "retailPriceValue": 3.99,
                "currency": "USD",
                "standardWebURL": "https://example.test/rent",
                "package": { "clearName": "Apple TV", "icon": "/icon/appletv" }
            }, {
                "monetizationType": "FLATRATE",
                "presentationType": "HD"
                // no package: dropped during mapping
            }]
        }))
        .unwrap();

        let c = node.into_candidate();
        assert_eq!(c.catalog_id.as_deref(), Some("438631"));
        assert_eq!(c.offers.len(), 1);
        let offer = &c.offers[0];
        assert_eq!(offer.monetization, MonetizationKind::Rent);
        assert_eq!(offer.presentation.label(), "4K");
        assert_eq!(offer.price_label(), "$3.99");
        assert_eq!(offer.package.name, "Apple TV");
    }
}
