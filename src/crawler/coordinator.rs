//! Crawler coordinator - recursive sitemap traversal
//!
//! This module resolves a sitemap URL into a flat list of links:
//! - Each sitemap is fetched with retries and exponential backoff
//! - Sitemap indexes fan out to all their children concurrently
//! - Url sets yield leaf links directly
//! - Failures are recorded on the affected entry and never abort siblings
//!
//! Every node gets its own retry allowance. There is no budget shared across
//! the tree, so the worst-case request count grows with
//! depth x branching x `max_retries`.

use crate::crawler::fetcher::{fetch_once, Transport};
use crate::crawler::parser::{parse_document, ParsedDocument, SitemapRef, UrlRef};
use crate::model::{ErrorKind, LinkResult};
use crate::options::{FetchOptions, RequestOverrides};
use crate::{FetchError, SitemapError};
use futures::future::{join_all, BoxFuture, FutureExt};
use reqwest::header::HeaderMap;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Main crawl coordinator
///
/// Holds the transport and the immutable crawl options. A coordinator can
/// serve any number of crawls; it keeps no state between them.
pub struct Coordinator {
    transport: Arc<dyn Transport>,
    options: FetchOptions,
    base_headers: HeaderMap,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `transport` - Performs the HTTP exchanges
    /// * `options` - Crawl options; validated here
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(SitemapError::Config)` - The options are out of range
    pub fn new(transport: Arc<dyn Transport>, options: FetchOptions) -> Result<Self, SitemapError> {
        options.validate()?;
        let base_headers = options.header_map()?;

        Ok(Self {
            transport,
            options,
            base_headers,
        })
    }

    /// Returns the crawl options
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Resolves a sitemap URL into a flat list of links
    ///
    /// Never fails: a sitemap that cannot be fetched or parsed becomes a
    /// single entry carrying the error, in the position its links would have
    /// occupied.
    pub fn crawl<'a>(
        &'a self,
        url: String,
        overrides: &'a RequestOverrides,
    ) -> BoxFuture<'a, Vec<LinkResult>> {
        self.crawl_at_depth(url, overrides, 0)
    }

    fn crawl_at_depth<'a>(
        &'a self,
        url: String,
        overrides: &'a RequestOverrides,
        depth: u32,
    ) -> BoxFuture<'a, Vec<LinkResult>> {
        async move {
            if let Some(max_depth) = self.options.max_depth {
                if depth > max_depth {
                    if self.options.debug {
                        tracing::warn!(url = %url, depth, max_depth, "Sitemap nested too deeply, skipping");
                    }
                    return vec![LinkResult::failed(
                        url,
                        ErrorKind::DepthExceeded,
                        format!("Sitemap index nesting exceeds the maximum depth of {}", max_depth),
                        None,
                    )];
                }
            }

            let document = match self.fetch_document(&url, overrides).await {
                Ok(document) => document,
                Err(failure) => return vec![failure],
            };

            match document {
                ParsedDocument::SitemapIndex(sitemaps) => {
                    self.crawl_children(sitemaps, overrides, depth).await
                }
                ParsedDocument::UrlSet(urls) => self.collect_links(urls),
            }
        }
        .boxed()
    }

    /// Fetches and parses a sitemap, retrying with exponential backoff
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Invalid document shape | Immediate failure entry |
    /// | Any other error, attempts left | Sleep, double the backoff, retry |
    /// | Any other error, last attempt | Failure entry with `retries_exhausted` |
    async fn fetch_document(
        &self,
        url: &str,
        overrides: &RequestOverrides,
    ) -> Result<ParsedDocument, LinkResult> {
        let max_retries = self.options.max_retries;
        let mut backoff = self.options.initial_backoff;

        for attempt in 1..=max_retries {
            if self.options.debug {
                tracing::info!(url = %url, attempt, max_retries, "Fetching sitemap");
            } else {
                tracing::trace!(url = %url, attempt, "Fetching sitemap");
            }

            let error = match self.attempt(url, overrides).await {
                Ok(document) => {
                    tracing::debug!(url = %url, entries = document.len(), "Parsed sitemap");
                    return Ok(document);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                if self.options.debug {
                    tracing::error!(url = %url, error = %error, "Sitemap is not usable");
                }
                return Err(LinkResult::from_fetch_error(url, &error, None));
            }

            if attempt == max_retries {
                if self.options.debug {
                    tracing::error!(
                        url = %url,
                        error = %error,
                        "Failed to fetch sitemap (Retry: {} / {}), giving up",
                        attempt,
                        max_retries
                    );
                }
                return Err(LinkResult::from_fetch_error(url, &error, Some(max_retries)));
            }

            if self.options.debug {
                tracing::warn!(
                    url = %url,
                    error = %error,
                    backoff_ms = backoff.as_millis() as u64,
                    "Failed to fetch sitemap (Retry: {} / {})",
                    attempt,
                    max_retries
                );
            }
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }

        // Only reachable if the retry loop made no attempt at all
        if self.options.debug {
            tracing::error!(url = %url, "Unexpected error occurred while fetching sitemap");
        }
        Err(LinkResult::failed(
            url,
            ErrorKind::Unexpected,
            format!("Failed to fetch sitemap after {} retries", max_retries),
            None,
        ))
    }

    /// One fetch-then-parse attempt
    async fn attempt(
        &self,
        url: &str,
        overrides: &RequestOverrides,
    ) -> Result<ParsedDocument, FetchError> {
        let response = fetch_once(
            self.transport.as_ref(),
            url,
            &self.options,
            &self.base_headers,
            overrides,
        )
        .await?;

        parse_document(&response.body)
    }

    /// Crawls every fresh child of a sitemap index concurrently
    ///
    /// Results are concatenated in listing order regardless of completion
    /// order. A child whose crawl panics is reported as an unexpected error.
    async fn crawl_children(
        &self,
        sitemaps: Vec<SitemapRef>,
        overrides: &RequestOverrides,
        depth: u32,
    ) -> Vec<LinkResult> {
        let children: Vec<SitemapRef> = sitemaps
            .into_iter()
            .filter(|sitemap| self.options.is_fresh(&sitemap.lastmod))
            .collect();

        tracing::debug!(children = children.len(), depth, "Crawling sitemap index children");

        let crawls = children.iter().map(|child| {
            AssertUnwindSafe(self.crawl_at_depth(child.loc.clone(), overrides, depth + 1))
                .catch_unwind()
        });
        let settled = join_all(crawls).await;

        let mut links = Vec::new();
        for (child, outcome) in children.iter().zip(settled) {
            match outcome {
                Ok(child_links) => links.extend(child_links),
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    tracing::error!(url = %child.loc, reason = %reason, "Sitemap crawl aborted");
                    links.push(LinkResult::failed(
                        child.loc.clone(),
                        ErrorKind::Unexpected,
                        format!(
                            "Unexpected error occurred while fetching sitemap: {} ({})",
                            child.loc, reason
                        ),
                        None,
                    ));
                }
            }
        }

        links
    }

    /// Maps the fresh entries of a url set to leaf links, in document order
    fn collect_links(&self, urls: Vec<UrlRef>) -> Vec<LinkResult> {
        urls.into_iter()
            .filter(|entry| self.options.is_fresh(&entry.lastmod))
            .map(|entry| LinkResult::page(entry.loc, entry.lastmod.timestamp()))
            .collect()
    }
}

/// Extracts a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
