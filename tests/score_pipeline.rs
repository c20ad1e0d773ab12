// tests/score_pipeline.rs
//
// End-to-end pipeline tests: real adapters wired to stub upstream clients,
// driven through the concurrent page-view aggregator. No sockets.
//
// Covered:
// - movie with an IMDb id: five configured sources, NotFound excluded
// - series: Serializd joins the set, the OMDb trio drops out
// - a stalled upstream times out into Errored without blocking completion

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use uniscore::aggregate::{SourceId, SourceOutcome};
use uniscore::identity::{MediaKind, TitleIdentity};
use uniscore::sources::letterboxd::{LetterboxdAdapter, LetterboxdClient, LetterboxdItem};
use uniscore::sources::mubi::{MubiAdapter, MubiClient, MubiFilm};
use uniscore::sources::omdb::{OmdbAdapter, OmdbClient, OmdbPayload};
use uniscore::sources::serializd::{ReviewsCandidate, ReviewsClient, SerializdAdapter};
use uniscore::sources::SourceAdapter;
use uniscore::view::aggregate_ratings;

struct LetterboxdStub(serde_json::Value);

#[async_trait]
impl LetterboxdClient for LetterboxdStub {
    async fn search(&self, _title: &str) -> Result<Vec<LetterboxdItem>> {
        Ok(serde_json::from_value(self.0.clone()).expect("letterboxd stub json"))
    }
}

struct OmdbStub(serde_json::Value);

#[async_trait]
impl OmdbClient for OmdbStub {
    async fn by_imdb_id(&self, _imdb_id: &str) -> Result<OmdbPayload> {
        Ok(serde_json::from_value(self.0.clone()).expect("omdb stub json"))
    }
}

struct MubiStub {
    films: Vec<MubiFilm>,
    html: String,
}

#[async_trait]
impl MubiClient for MubiStub {
    async fn search(&self, _query: &str) -> Result<Vec<MubiFilm>> {
        Ok(self.films.clone())
    }
    async fn film_page(&self, _url: &str) -> Result<String> {
        Ok(self.html.clone())
    }
}

struct SerializdStub(serde_json::Value);

#[async_trait]
impl ReviewsClient for SerializdStub {
    async fn search(&self, _query: &str) -> Result<Vec<ReviewsCandidate>> {
        Ok(serde_json::from_value(self.0.clone()).expect("serializd stub json"))
    }
}

/// A reviews upstream that never answers; only the timeout ends it.
struct StalledReviews;

#[async_trait]
impl ReviewsClient for StalledReviews {
    async fn search(&self, _query: &str) -> Result<Vec<ReviewsCandidate>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

fn mubi_page(average: f64) -> String {
    format!(
        r#"<script id="__NEXT_DATA__" type="application/json">
        {{"props":{{"initialProps":{{"pageProps":{{"initFilm":
        {{"average_rating_out_of_ten":{average},"number_of_ratings":55}}}}}}}}}}
        </script>"#
    )
}

fn dune() -> TitleIdentity {
    TitleIdentity {
        title: "Dune".into(),
        year: Some(2021),
        kind: MediaKind::Movie,
        people: vec!["Denis Villeneuve".into()],
        catalog_id: "438631".into(),
        imdb_id: Some("tt1160419".into()),
    }
}

fn the_bear() -> TitleIdentity {
    TitleIdentity {
        title: "The Bear".into(),
        year: Some(2022),
        kind: MediaKind::Series,
        people: vec!["Christopher Storer".into()],
        catalog_id: "136315".into(),
        imdb_id: None,
    }
}

fn score_of(outcome: &SourceOutcome) -> Option<u8> {
    match outcome {
        SourceOutcome::Found(r) => Some(r.score),
        _ => None,
    }
}

#[tokio::test]
async fn movie_scores_average_across_found_sources_only() {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(OmdbAdapter::new(Arc::new(OmdbStub(serde_json::json!({
            "Response": "True",
            "imdbRating": "8.0",
            "imdbVotes": "912,345",
            "Metascore": "74",
            "Ratings": [{ "Source": "Rotten Tomatoes", "Value": "83%" }]
        }))))),
        Arc::new(LetterboxdAdapter::new(Arc::new(LetterboxdStub(
            serde_json::json!([{ "film": {
                "name": "Dune",
                "rating": 4.1,
                "link": "https://boxd.it/dune",
                "links": [{ "type": "tmdb", "id": "438631" }]
            }}]),
        )))),
        // Not carried by this catalog: contributes NotFound, not a zero.
        Arc::new(MubiAdapter::new(Arc::new(MubiStub {
            films: vec![],
            html: String::new(),
        }))),
    ];

    let cancel = CancellationToken::new();
    let board = aggregate_ratings(&adapters, &dune(), Duration::from_secs(5), &cancel, |_, _| {})
        .await;

    assert!(board.is_complete());
    let outcomes = board.outcomes();
    assert_eq!(outcomes.len(), 5, "movie with an IMDb id has five sources");
    assert!(!outcomes.contains_key(&SourceId::Serializd));

    assert_eq!(score_of(&outcomes[&SourceId::Imdb]), Some(80));
    assert_eq!(score_of(&outcomes[&SourceId::RottenTomatoes]), Some(83));
    assert_eq!(score_of(&outcomes[&SourceId::Metacritic]), Some(74));
    assert_eq!(score_of(&outcomes[&SourceId::Letterboxd]), Some(82));
    assert_eq!(outcomes[&SourceId::Mubi], SourceOutcome::NotFound);

    // (80 + 83 + 74 + 82) / 4 = 79.75, rounded half-up.
    let composite = board.recompute();
    assert_eq!(composite.value, Some(80));
    assert_eq!(composite.contributing_count, 4);
}

#[tokio::test]
async fn series_swaps_the_imdb_trio_for_serializd() {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        // Configured-source check happens per identity: the OMDb adapter is
        // present but declares nothing for a title without an IMDb id.
        Arc::new(OmdbAdapter::new(Arc::new(OmdbStub(
            serde_json::json!({ "Response": "False" }),
        )))),
        Arc::new(LetterboxdAdapter::new(Arc::new(LetterboxdStub(
            serde_json::json!([{ "film": {
                "name": "The Bear",
                "rating": 4.5,
                "link": "https://boxd.it/the-bear",
                "links": [{ "type": "tmdb", "id": "136315" }]
            }}]),
        )))),
        Arc::new(MubiAdapter::new(Arc::new(MubiStub {
            films: vec![MubiFilm {
                title: "The Bear".into(),
                year: Some(2022),
                canonical_url: "https://mubi.test/series/the-bear".into(),
            }],
            html: mubi_page(8.6),
        }))),
        Arc::new(SerializdAdapter::new(Arc::new(SerializdStub(
            serde_json::json!([{
                "title": "The Bear",
                "year": 2022,
                "rating_value": "3.75",
                "rating_count": "2,410",
                "url": "https://serializd.test/show/the-bear"
            }]),
        )))),
    ];

    let cancel = CancellationToken::new();
    let mut updates = 0usize;
    let board = aggregate_ratings(
        &adapters,
        &the_bear(),
        Duration::from_secs(5),
        &cancel,
        |_, _| updates += 1,
    )
    .await;

    assert!(board.is_complete());
    let outcomes = board.outcomes();
    assert_eq!(outcomes.len(), 3, "series without an IMDb id has three sources");
    assert!(!outcomes.contains_key(&SourceId::Imdb));

    assert_eq!(score_of(&outcomes[&SourceId::Letterboxd]), Some(90));
    assert_eq!(score_of(&outcomes[&SourceId::Mubi]), Some(86));
    assert_eq!(score_of(&outcomes[&SourceId::Serializd]), Some(75));

    // (90 + 86 + 75) / 3 = 83.67 -> 84.
    let composite = board.recompute();
    assert_eq!(composite.value, Some(84));
    assert_eq!(composite.contributing_count, 3);

    // Each adapter answers once; the composite is refreshed per merge.
    assert_eq!(updates, 3);
}

#[tokio::test(start_paused = true)]
async fn stalled_upstream_times_out_into_errored() {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(LetterboxdAdapter::new(Arc::new(LetterboxdStub(
            serde_json::json!([{ "film": {
                "name": "The Bear",
                "rating": 4.5,
                "links": [{ "id": "136315" }]
            }}]),
        )))),
        Arc::new(MubiAdapter::new(Arc::new(MubiStub {
            films: vec![],
            html: String::new(),
        }))),
        Arc::new(SerializdAdapter::new(Arc::new(StalledReviews))),
    ];

    let cancel = CancellationToken::new();
    let board = aggregate_ratings(
        &adapters,
        &the_bear(),
        Duration::from_millis(250),
        &cancel,
        |_, _| {},
    )
    .await;

    assert!(board.is_complete(), "timeout must still terminate the view");
    let outcomes = board.outcomes();
    assert!(matches!(
        outcomes[&SourceId::Serializd],
        SourceOutcome::Errored { .. }
    ));

    // The stalled source never drags the average down.
    let composite = board.recompute();
    assert_eq!(composite.value, Some(90));
    assert_eq!(composite.contributing_count, 1);
}
