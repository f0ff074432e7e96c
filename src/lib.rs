//! Sitemap-Flattener: fetches XML sitemaps and flattens sitemap-index trees
//!
//! This crate resolves a sitemap URL into a flat list of page URLs with
//! optional last-modified metadata. Sitemap-index documents are followed
//! recursively, failed fetches are retried with exponential backoff, and
//! per-sitemap failures are reported as data instead of aborting the crawl.

pub mod config;
pub mod crawler;
pub mod model;
pub mod options;
pub mod output;
pub mod sitemapper;

use model::ErrorKind;
use thiserror::Error;

/// Main error type for Sitemap-Flattener operations
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Sitemap traversal failed for {url}: {message}")]
    Orchestration { url: String, message: String },
}

/// Classified failure of a single fetch-and-parse attempt
///
/// These never escape the crawl; the coordinator turns them into
/// [`model::LinkError`] entries on the affected link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error occurred: {message}")]
    Network { url: String, message: String },

    #[error("Request timed out after {timeout_ms} milliseconds for url: '{url}'")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP Error: {status}")]
    Http { url: String, status: u16 },

    #[error("Failed to decompress gzip body: {0}")]
    Decompression(String),

    #[error("Failed to parse sitemap XML: {0}")]
    Parse(String),

    #[error("Parsed response does not contain a sitemapindex or urlset: {0}")]
    InvalidSitemap(String),
}

impl FetchError {
    /// Maps the error onto the kind reported in link results
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http { .. } => ErrorKind::Http,
            Self::Decompression(_) => ErrorKind::Decompression,
            Self::Parse(_) => ErrorKind::Parse,
            Self::InvalidSitemap(_) => ErrorKind::InvalidSitemap,
        }
    }

    /// Returns false when another attempt cannot change the outcome
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidSitemap(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for Sitemap-Flattener operations
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{HttpTransport, Transport};
pub use model::{FetchSitemapResult, LinkError, LinkResult};
pub use options::{FetchOptions, RequestOverrides};
pub use sitemapper::Sitemapper;
