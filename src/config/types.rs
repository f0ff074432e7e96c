use crate::options::{
    FetchOptions, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Sitemap-Flattener
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Headers sent with every request
    #[serde(rename = "request-headers", default)]
    pub request_headers: BTreeMap<String, String>,
}

/// Fetch and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request deadline (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per sitemap URL
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Only keep entries modified after this instant (RFC 3339)
    #[serde(default)]
    pub lastmod: Option<DateTime<Utc>>,

    /// Log every attempt
    #[serde(default)]
    pub debug: bool,

    /// Wait before the first retry (milliseconds)
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Maximum sitemap-index nesting below the root
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF.as_millis() as u64
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            lastmod: None,
            debug: false,
            backoff_ms: default_backoff_ms(),
            max_depth: None,
        }
    }
}

impl Config {
    /// Converts the file configuration into crawl options
    pub fn fetch_options(&self) -> FetchOptions {
        let request_headers = if self.request_headers.is_empty() {
            None
        } else {
            Some(self.request_headers.clone())
        };

        FetchOptions {
            timeout_ms: self.fetch.timeout_ms,
            max_retries: self.fetch.max_retries,
            lastmod: self.fetch.lastmod,
            debug: self.fetch.debug,
            request_headers,
            initial_backoff: Duration::from_millis(self.fetch.backoff_ms),
            max_depth: self.fetch.max_depth,
        }
    }
}
