// src/resolve.rs
//! Three-tier title resolver shared by the search-based source adapters.
//!
//! Tier 1: raw substring match in either direction + exact year.
//! Tier 2: same substring test, year within ±1 (regional release skew).
//! Tier 3: normalized substring test (lowercased, diacritics stripped,
//!         non-alphanumerics removed), year within ±1.
//!
//! The first candidate matching a tier wins; tiers are tried in order and
//! the search stops at the first tier with a hit. This is a cheap heuristic,
//! not exact identity resolution — ambiguous franchises and remakes can
//! mismatch, which we accept.
//!
//! Policy for a missing identity year: year filtering is skipped in every
//! tier and the substring test alone decides. A candidate without a year
//! never matches while the identity has one.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::identity::TitleIdentity;

/// Minimal view of one raw search result, implemented per source schema.
pub trait TitleCandidate {
    fn title(&self) -> &str;
    fn year(&self) -> Option<i32>;
}

/// Pick zero-or-one candidate for the identity. Candidate order is whatever
/// the source returned; no ranking happens within a tier.
pub fn resolve<'a, C: TitleCandidate>(
    candidates: &'a [C],
    identity: &TitleIdentity,
) -> Option<&'a C> {
    let tier1 = candidates
        .iter()
        .find(|c| substring_match(c.title(), &identity.title) && year_exact(c.year(), identity.year));
    if let Some(hit) = tier1 {
        return Some(hit);
    }

    let tier2 = candidates
        .iter()
        .find(|c| substring_match(c.title(), &identity.title) && year_window(c.year(), identity.year));
    if let Some(hit) = tier2 {
        return Some(hit);
    }

    let wanted = normalize_title(&identity.title);
    candidates.iter().find(|c| {
        substring_match(&normalize_title(c.title()), &wanted)
            && year_window(c.year(), identity.year)
    })
}

fn substring_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn year_exact(candidate: Option<i32>, wanted: Option<i32>) -> bool {
    match wanted {
        None => true,
        Some(w) => candidate == Some(w),
    }
}

fn year_window(candidate: Option<i32>, wanted: Option<i32>) -> bool {
    match (candidate, wanted) {
        (_, None) => true,
        (Some(c), Some(w)) => (c - w).abs() <= 1,
        (None, Some(_)) => false,
    }
}

/// Lowercase, strip diacritics (NFD + drop combining marks), keep ASCII
/// alphanumerics only. "Amélie" and "amelie" compare equal afterwards.
pub fn normalize_title(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
