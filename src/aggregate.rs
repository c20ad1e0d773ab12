// src/aggregate.rs
//! Outcome bookkeeping and the composite-score reducer.
//!
//! The board is an accumulating map keyed by source name. Adapters merge
//! terminal outcomes one at a time; the composite is fully recomputed after
//! every merge (it is cheap) instead of maintaining running sums.
//!
//! Error taxonomy (see also the adapter modules): upstream-unavailable and
//! timeouts become `Errored`, resolver misses and malformed payloads become
//! `NotFound`. All three exclude the source from the mean — a source with
//! no rating is never scored as zero. Only a failed identity lookup is a
//! real error, and that never reaches this module.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::identity::{MediaKind, TitleIdentity};
use crate::rating::NormalizedRating;

/// Every rating source that can contribute a badge. Display names are the
/// serialized form used in the API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SourceId {
    #[serde(rename = "IMDb")]
    Imdb,
    #[serde(rename = "Rotten Tomatoes")]
    RottenTomatoes,
    #[serde(rename = "Metacritic")]
    Metacritic,
    #[serde(rename = "Letterboxd")]
    Letterboxd,
    #[serde(rename = "Mubi")]
    Mubi,
    #[serde(rename = "Serializd")]
    Serializd,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Imdb => "IMDb",
            SourceId::RottenTomatoes => "Rotten Tomatoes",
            SourceId::Metacritic => "Metacritic",
            SourceId::Letterboxd => "Letterboxd",
            SourceId::Mubi => "Mubi",
            SourceId::Serializd => "Serializd",
        }
    }
}

/// Per-source state for the current page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceOutcome {
    /// Adapter dispatched, no terminal result yet.
    Pending,
    Found(NormalizedRating),
    /// Source reachable, but no candidate matched or no rating was present.
    NotFound,
    /// Source unreachable, timed out, or otherwise failed for this view.
    Errored { reason: String },
}

impl SourceOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SourceOutcome::Pending)
    }
}

/// The aggregate the UI renders inside the hexagon. `value` is `None`
/// ("N/A") exactly when no source contributed; zero is never emergent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompositeScore {
    pub value: Option<u8>,
    pub contributing_count: usize,
}

/// Accumulating outcome map for one page view. Created with every
/// configured source `Pending`; sources not configured for this identity
/// are absent, never defaulted to `NotFound`.
#[derive(Debug, Clone)]
pub struct ScoreBoard {
    outcomes: BTreeMap<SourceId, SourceOutcome>,
}

/// Which rating sources apply to this identity. The reviews database
/// (Serializd) covers series only; the OMDb-backed trio requires a known
/// IMDb id. Letterboxd and Mubi always apply.
pub fn configured_sources(identity: &TitleIdentity) -> Vec<SourceId> {
    let mut set = vec![SourceId::Letterboxd, SourceId::Mubi];
    if identity.imdb_id.is_some() {
        set.extend([
            SourceId::Imdb,
            SourceId::RottenTomatoes,
            SourceId::Metacritic,
        ]);
    }
    if identity.kind == MediaKind::Series {
        set.push(SourceId::Serializd);
    }
    set
}

impl ScoreBoard {
    pub fn for_identity(identity: &TitleIdentity) -> Self {
        let outcomes = configured_sources(identity)
            .into_iter()
            .map(|s| (s, SourceOutcome::Pending))
            .collect();
        Self { outcomes }
    }

    #[cfg(test)]
    pub fn from_outcomes(outcomes: BTreeMap<SourceId, SourceOutcome>) -> Self {
        Self { outcomes }
    }

    /// Replace-by-key merge of one source's terminal outcome. Reports for
    /// sources not configured on this board are dropped.
    pub fn record(&mut self, source: SourceId, outcome: SourceOutcome) {
        if let Some(slot) = self.outcomes.get_mut(&source) {
            *slot = outcome;
        } else {
            tracing::debug!(source = source.as_str(), "ignoring unconfigured source");
        }
    }

    pub fn outcomes(&self) -> &BTreeMap<SourceId, SourceOutcome> {
        &self.outcomes
    }

    /// Unweighted mean over every `Found` outcome, rounded to an integer.
    /// Pure over the current map: calling it twice yields the same score.
    pub fn recompute(&self) -> CompositeScore {
        let scores: Vec<u32> = self
            .outcomes
            .values()
            .filter_map(|o| match o {
                SourceOutcome::Found(r) => Some(u32::from(r.score)),
                _ => None,
            })
            .collect();

        if scores.is_empty() {
            return CompositeScore {
                value: None,
                contributing_count: 0,
            };
        }

        let sum: u32 = scores.iter().sum();
        let mean = (f64::from(sum) / scores.len() as f64).round();
        CompositeScore {
            value: Some(mean.clamp(0.0, 100.0) as u8),
            contributing_count: scores.len(),
        }
    }

    /// True once every configured source reached a terminal outcome.
    /// This is the "safe to stop the loading indicator" predicate; it is
    /// independent of whether any source actually contributed.
    pub fn is_complete(&self) -> bool {
        self.outcomes.values().all(SourceOutcome::is_terminal)
    }
}
