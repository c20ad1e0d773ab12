// src/config.rs
//! Environment-driven configuration. Every upstream base URL has a default
//! pointing at the real service so local runs only need the two API keys;
//! tests override the URLs to point at stubs.

use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tmdb_api_key: String,
    pub omdb_api_key: String,
    pub tmdb_base_url: String,
    pub omdb_base_url: String,
    pub letterboxd_base_url: String,
    pub mubi_base_url: String,
    pub serializd_base_url: String,
    pub justwatch_graphql_url: String,
    /// Budget for a single adapter fetch within one page view.
    pub source_timeout: Duration,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key =
            std::env::var("TMDB_API_KEY").context("TMDB_API_KEY must be set")?;
        let omdb_api_key =
            std::env::var("OMDB_API_KEY").context("OMDB_API_KEY must be set")?;

        let source_timeout_ms = match std::env::var("UNISCORE_SOURCE_TIMEOUT_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("UNISCORE_SOURCE_TIMEOUT_MS must be an integer (milliseconds)")?,
            Err(_) => DEFAULT_SOURCE_TIMEOUT_MS,
        };

        Ok(Self {
            tmdb_api_key,
            omdb_api_key,
            tmdb_base_url: env_or("TMDB_BASE_URL", "https://api.themoviedb.org/3"),
            omdb_base_url: env_or("OMDB_BASE_URL", "https://www.omdbapi.com"),
            letterboxd_base_url: env_or("LETTERBOXD_BASE_URL", "https://letterboxd.com"),
            mubi_base_url: env_or("MUBI_BASE_URL", "https://api.mubi.com"),
            serializd_base_url: env_or("SERIALIZD_BASE_URL", "https://www.serializd.com"),
            justwatch_graphql_url: env_or(
                "JUSTWATCH_GRAPHQL_URL",
                "https://apis.justwatch.com/graphql",
            ),
            source_timeout: Duration::from_millis(source_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var mutation is process-global, so every from_env scenario lives
    // in this single test to keep the variables out of parallel tests.
    #[test]
    fn from_env_applies_defaults_and_validates_the_timeout() {
        std::env::set_var("TMDB_API_KEY", "tmdb-test-key");
        std::env::set_var("OMDB_API_KEY", "omdb-test-key");
        std::env::remove_var("UNISCORE_SOURCE_TIMEOUT_MS");

        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.tmdb_api_key, "tmdb-test-key");
        assert_eq!(cfg.tmdb_base_url, "https://api.themoviedb.org/3");
        assert_eq!(
            cfg.justwatch_graphql_url,
            "https://apis.justwatch.com/graphql"
        );
        assert_eq!(
            cfg.source_timeout,
            Duration::from_millis(DEFAULT_SOURCE_TIMEOUT_MS)
        );

        std::env::set_var("UNISCORE_SOURCE_TIMEOUT_MS", "2500");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.source_timeout, Duration::from_millis(2500));

        std::env::set_var("UNISCORE_SOURCE_TIMEOUT_MS", "soon");
        assert!(AppConfig::from_env().is_err(), "non-numeric timeout");

        std::env::remove_var("UNISCORE_SOURCE_TIMEOUT_MS");
        std::env::remove_var("TMDB_API_KEY");
        assert!(AppConfig::from_env().is_err(), "missing required key");

        std::env::remove_var("OMDB_API_KEY");
    }
}
