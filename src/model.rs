/// Result types produced by a sitemap crawl
///
/// This module defines the link entries and error descriptions returned to
/// callers of [`crate::Sitemapper::fetch`].
use crate::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Classification of a failure recorded on a link result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    /// Connection-level failure (refused, DNS, TLS, ...)
    #[serde(rename = "NetworkError")]
    Network,

    /// The per-request deadline fired before a response arrived
    #[serde(rename = "TimeoutError")]
    Timeout,

    /// Non-success HTTP status
    #[serde(rename = "HTTPError")]
    Http,

    /// Body looked like gzip but could not be decompressed
    #[serde(rename = "DecompressionError")]
    Decompression,

    /// Body was not well-formed XML
    #[serde(rename = "ParseError")]
    Parse,

    /// Document is neither a sitemap index nor a url set
    #[serde(rename = "InvalidSitemapError")]
    InvalidSitemap,

    /// Sitemap index nested deeper than the configured limit
    #[serde(rename = "DepthExceededError")]
    DepthExceeded,

    /// Catch-all for failures outside the classified kinds
    #[serde(rename = "UnexpectedError")]
    Unexpected,
}

impl ErrorKind {
    /// Returns the name used when reporting this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NetworkError",
            Self::Timeout => "TimeoutError",
            Self::Http => "HTTPError",
            Self::Decompression => "DecompressionError",
            Self::Parse => "ParseError",
            Self::InvalidSitemap => "InvalidSitemapError",
            Self::DepthExceeded => "DepthExceededError",
            Self::Unexpected => "UnexpectedError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure details attached to a link result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkError {
    /// What went wrong
    pub kind: ErrorKind,

    /// Human-readable description
    pub message: String,

    /// Number of attempts made before giving up, when the failure was retried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries_exhausted: Option<u32>,
}

/// One resolved page URL, or one sitemap that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkResult {
    pub loc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LinkError>,
}

impl LinkResult {
    /// Creates a successful leaf entry
    pub fn page(loc: impl Into<String>, lastmod: Option<DateTime<Utc>>) -> Self {
        Self {
            loc: loc.into(),
            lastmod,
            error: None,
        }
    }

    /// Creates a failure entry for a sitemap URL
    pub fn failed(
        loc: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
        retries_exhausted: Option<u32>,
    ) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
            error: Some(LinkError {
                kind,
                message: message.into(),
                retries_exhausted,
            }),
        }
    }

    /// Creates a failure entry from a classified fetch error
    pub fn from_fetch_error(
        loc: impl Into<String>,
        error: &FetchError,
        retries_exhausted: Option<u32>,
    ) -> Self {
        Self::failed(loc, error.kind(), error.to_string(), retries_exhausted)
    }

    /// Returns true if this entry records a failure
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Terminal output of a top-level fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchSitemapResult {
    /// The originally requested root URL
    pub url: String,

    /// Flattened links in source order
    pub links: Vec<LinkResult>,
}

impl FetchSitemapResult {
    /// Iterates over the entries that record a failure
    pub fn errors(&self) -> impl Iterator<Item = &LinkResult> {
        self.links.iter().filter(|link| link.is_error())
    }

    /// Iterates over the successfully resolved page entries
    pub fn pages(&self) -> impl Iterator<Item = &LinkResult> {
        self.links.iter().filter(|link| !link.is_error())
    }

    /// Returns true if no sitemap in the tree failed
    pub fn is_complete(&self) -> bool {
        self.errors().next().is_none()
    }
}
