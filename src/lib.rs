// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod config;
pub mod identity;
pub mod metrics;
pub mod offers;
pub mod rating;
pub mod resolve;
pub mod sources;
pub mod view;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{CompositeScore, ScoreBoard, SourceId, SourceOutcome};
pub use crate::identity::{MediaKind, TitleIdentity};
pub use crate::offers::OfferBuckets;
pub use crate::rating::NormalizedRating;
pub use crate::view::aggregate_ratings;
