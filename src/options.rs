//! Fetch options and per-call request overrides

use crate::config::validation::{build_header_map, validate_fetch_options};
use crate::crawler::Lastmod;
use crate::ConfigResult;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default number of attempts per sitemap
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default wait before the second attempt; doubles after every failure
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Options governing a sitemap crawl
///
/// Options are fixed once a [`crate::Sitemapper`] is built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Deadline for a single request, in milliseconds
    pub timeout_ms: u64,

    /// Attempts per sitemap URL (at least 1)
    pub max_retries: u32,

    /// Only keep entries modified strictly after this instant
    pub lastmod: Option<DateTime<Utc>>,

    /// Emit per-attempt log lines
    pub debug: bool,

    /// Headers sent with every request, below per-call overrides
    pub request_headers: Option<BTreeMap<String, String>>,

    /// Wait before the first retry
    pub initial_backoff: Duration,

    /// Maximum sitemap-index nesting below the root; `None` is unlimited
    pub max_depth: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            lastmod: None,
            debug: false,
            request_headers: None,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_depth: None,
        }
    }
}

impl FetchOptions {
    /// Checks the options against their documented ranges
    pub fn validate(&self) -> ConfigResult<()> {
        validate_fetch_options(self)
    }

    /// Returns the per-request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the construction-level headers as a header map
    pub fn header_map(&self) -> ConfigResult<HeaderMap> {
        match &self.request_headers {
            Some(headers) => build_header_map(headers),
            None => Ok(HeaderMap::new()),
        }
    }

    /// Returns true if an entry with the given `lastmod` survives the cutoff
    ///
    /// Without a cutoff every entry is kept. With one, entries without a
    /// `lastmod` are kept and entries whose `lastmod` cannot be read are
    /// dropped.
    pub fn is_fresh(&self, lastmod: &Lastmod) -> bool {
        match (&self.lastmod, lastmod) {
            (None, _) | (Some(_), Lastmod::Missing) => true,
            (Some(cutoff), Lastmod::Valid(modified)) => modified > cutoff,
            (Some(_), Lastmod::Unparseable(_)) => false,
        }
    }
}

/// Request-level overrides applied to every request of one fetch call
///
/// Headers given here take precedence over both the construction-level
/// headers and the injected defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    /// HTTP method; GET when unset
    pub method: Option<Method>,

    pub headers: HeaderMap,

    pub body: Option<Vec<u8>>,
}

impl RequestOverrides {
    /// Builds overrides carrying only the given headers
    pub fn from_headers<'a, I>(pairs: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let headers: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            headers: build_header_map(&headers)?,
            ..Self::default()
        })
    }

    /// Adds a header, replacing any previous value with the same name
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the HTTP method
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
}
