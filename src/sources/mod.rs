// src/sources/mod.rs
pub mod justwatch;
pub mod letterboxd;
pub mod mubi;
pub mod omdb;
pub mod serializd;
pub mod tmdb;

use anyhow::Result;

use crate::aggregate::{SourceId, SourceOutcome};
use crate::identity::TitleIdentity;

/// One terminal outcome produced by an adapter for one source name.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: SourceId,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn new(source: SourceId, outcome: SourceOutcome) -> Self {
        Self { source, outcome }
    }

    pub fn not_found(source: SourceId) -> Self {
        Self::new(source, SourceOutcome::NotFound)
    }
}

/// One external rating source, wrapping its resolver + extractor against
/// the source's own schema. Adapters are independently callable and
/// independently failable: an `Err` here never aborts the page view, it is
/// translated into `Errored` outcomes for the adapter's declared sources.
///
/// Resolver misses and unparsable payloads are NOT errors: adapters report
/// them as `Ok` with `NotFound` outcomes.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Outcome keys this adapter will report for the given identity.
    /// Empty means the adapter is not configured for this view and is
    /// never dispatched (its outcomes are absent, not `NotFound`).
    fn sources(&self, identity: &TitleIdentity) -> Vec<SourceId>;

    /// Fetch, resolve and extract. Must return one report per source
    /// declared by `sources` unless the whole fetch fails.
    async fn fetch(&self, identity: &TitleIdentity) -> Result<Vec<SourceReport>>;
}
