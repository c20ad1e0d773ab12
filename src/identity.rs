// src/identity.rs
// Canonical title identity for one page view, built from the authoritative
// metadata catalog and handed read-only to every source adapter.

use serde::{Deserialize, Serialize};

/// Media kind as exposed in URLs and used to pick the configured source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    /// TV series (the catalog calls these "tv").
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    /// Path segment understood by the metadata catalog.
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    pub fn from_path(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Series),
            _ => None,
        }
    }
}

/// The canonical query key for one page view. Immutable once built;
/// every adapter receives a shared reference (or a clone for its task).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleIdentity {
    pub title: String,
    /// Release year. `None` for e.g. in-production series without a date;
    /// the resolver then skips year filtering entirely (see `resolve`).
    pub year: Option<i32>,
    pub kind: MediaKind,
    /// Directors for movies, creators for series. May be empty.
    pub people: Vec<String>,
    /// Canonical id in the authoritative catalog.
    pub catalog_id: String,
    /// IMDb-style external id, when the catalog knows one.
    pub imdb_id: Option<String>,
}

impl TitleIdentity {
    pub fn first_person(&self) -> Option<&str> {
        self.people.first().map(String::as_str)
    }
}

/// Extract a year from a catalog date string like "2021-10-22".
pub fn year_from_date(date: &str) -> Option<i32> {
    let head = date.split('-').next()?;
    let y: i32 = head.parse().ok()?;
    (y > 0).then_some(y)
}
