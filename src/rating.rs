// src/rating.rs
//! Raw rating extraction helpers and the 0-100 normalizer.
//!
//! Every source reports on its own scale; the normalizer maps them all onto
//! whole-number 0-100 via a fixed per-scale multiplier and round-half-up.
//! Sub-point precision is deliberately discarded so the composite stays a
//! whole number.

use serde::{Deserialize, Serialize};

/// Native scale of one upstream rating value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatingScale {
    /// Review aggregators rating out of five stars.
    ZeroToFive,
    /// e.g. "7.4" out of ten.
    ZeroToTen,
    /// Already on the target scale.
    ZeroToHundred,
    /// 0-100 carried as "94%" style strings.
    Percent,
}

impl RatingScale {
    fn multiplier(&self) -> f64 {
        match self {
            RatingScale::ZeroToFive => 20.0,
            RatingScale::ZeroToTen => 10.0,
            RatingScale::ZeroToHundred | RatingScale::Percent => 1.0,
        }
    }
}

/// One rating as extracted from a matched candidate, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRating {
    pub value: f64,
    pub scale: RatingScale,
    /// Vote/review count when the source reports one. Informational only:
    /// the composite mean is unweighted.
    pub sample_size: Option<u64>,
}

impl RawRating {
    pub fn new(value: f64, scale: RatingScale) -> Self {
        Self {
            value,
            scale,
            sample_size: None,
        }
    }

    pub fn with_sample_size(mut self, n: Option<u64>) -> Self {
        self.sample_size = n;
        self
    }
}

/// One source's contribution after normalization. Invariant: 0..=100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRating {
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Map a raw rating onto the common 0-100 integer scale.
/// Round-half-up (inputs are non-negative), clamped into range.
pub fn normalize(raw: &RawRating) -> u8 {
    let scaled = (raw.value * raw.scale.multiplier()).round();
    scaled.clamp(0.0, 100.0) as u8
}

/// Tolerant numeric parse for upstream rating strings.
/// Handles the literal "N/A" sentinel (absent, not zero), a trailing "%",
/// and surrounding whitespace. Anything unparsable yields `None`, as do
/// "NaN"/"inf" (which `f64::from_str` would otherwise accept) — a
/// non-finite value must stay absent, not collapse to a zero score.
pub fn parse_rating_value(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("n/a") {
        return None;
    }
    let t = t.strip_suffix('%').unwrap_or(t).trim();
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a sample-size string like "1,234,567". `None` on anything odd.
pub fn parse_sample_size(s: &str) -> Option<u64> {
    let t: String = s.trim().chars().filter(|c| *c != ',').collect();
    if t.is_empty() || t.eq_ignore_ascii_case("n/a") {
        return None;
    }
    t.parse::<u64>().ok()
}
