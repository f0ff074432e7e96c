//! Crawler module for sitemap fetching and flattening
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with header defaults, deadlines and error classification
//! - Gzip detection and sitemap XML parsing
//! - Recursive sitemap-index traversal with retries and backoff

mod coordinator;
mod fetcher;
mod gzip;
mod parser;

pub use coordinator::Coordinator;
pub(crate) use coordinator::panic_message;
pub use fetcher::{
    build_headers, build_http_client, fetch_once, HttpTransport, RawResponse, SitemapRequest,
    Transport, DEFAULT_ACCEPT_ENCODING, DEFAULT_CONTENT_TYPE, DEFAULT_USER_AGENT,
};
pub use gzip::{gunzip, is_gzip};
pub use parser::{parse_document, parse_lastmod, Lastmod, ParsedDocument, SitemapRef, UrlRef};

use crate::model::LinkResult;
use crate::options::{FetchOptions, RequestOverrides};
use crate::SitemapError;
use std::sync::Arc;

/// Crawls a sitemap URL over HTTP and returns the flattened links
///
/// This is a shortcut for building a [`Coordinator`] over an
/// [`HttpTransport`] and crawling a single root.
///
/// # Returns
///
/// * `Ok(Vec<LinkResult>)` - Flattened links; per-sitemap failures are entries
/// * `Err(SitemapError)` - The options were invalid or the client could not be built
pub async fn crawl(url: &str, options: FetchOptions) -> Result<Vec<LinkResult>, SitemapError> {
    let transport = Arc::new(HttpTransport::new(build_http_client()?));
    let coordinator = Coordinator::new(transport, options)?;
    Ok(coordinator.crawl(url.to_string(), &RequestOverrides::default()).await)
}
