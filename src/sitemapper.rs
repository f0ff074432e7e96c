//! Public entry point for fetching and flattening sitemaps

use crate::crawler::{build_http_client, panic_message, Coordinator, HttpTransport, Transport};
use crate::model::FetchSitemapResult;
use crate::options::{FetchOptions, RequestOverrides};
use crate::SitemapError;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Fetches sitemaps and flattens sitemap-index trees into page links
///
/// # Example
///
/// ```no_run
/// use sitemap_flattener::{FetchOptions, Sitemapper};
///
/// # async fn example() -> Result<(), sitemap_flattener::SitemapError> {
/// let sitemapper = Sitemapper::new(FetchOptions::default())?;
/// let result = sitemapper.fetch("https://example.com/sitemap.xml", None).await?;
///
/// for link in result.errors() {
///     eprintln!("failed: {}", link.loc);
/// }
/// println!("{} pages", result.pages().count());
/// # Ok(())
/// # }
/// ```
pub struct Sitemapper {
    coordinator: Coordinator,
}

impl Sitemapper {
    /// Creates a sitemapper that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Sitemapper)` - Options are valid and the client was built
    /// * `Err(SitemapError)` - Invalid options or client construction failure
    pub fn new(options: FetchOptions) -> Result<Self, SitemapError> {
        let transport = Arc::new(HttpTransport::new(build_http_client()?));
        Self::with_transport(transport, options)
    }

    /// Creates a sitemapper over a caller-provided transport
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        options: FetchOptions,
    ) -> Result<Self, SitemapError> {
        Ok(Self {
            coordinator: Coordinator::new(transport, options)?,
        })
    }

    /// Returns the options this sitemapper was built with
    pub fn options(&self) -> &FetchOptions {
        self.coordinator.options()
    }

    /// Fetches a sitemap and returns every page link reachable from it
    ///
    /// Per-sitemap failures are reported on the returned links; inspect
    /// [`FetchSitemapResult::errors`] to detect them. This call itself fails
    /// only if the traversal aborts unexpectedly.
    ///
    /// # Arguments
    ///
    /// * `url` - The root sitemap or sitemap-index URL
    /// * `overrides` - Method, headers and body applied to every request
    pub async fn fetch(
        &self,
        url: &str,
        overrides: Option<RequestOverrides>,
    ) -> Result<FetchSitemapResult, SitemapError> {
        let options = self.options();
        if options.debug {
            tracing::info!(
                url = %url,
                timeout_ms = options.timeout_ms,
                max_retries = options.max_retries,
                lastmod = ?options.lastmod,
                max_depth = ?options.max_depth,
                "Fetching sitemap"
            );
        }

        let overrides = overrides.unwrap_or_default();
        let mut result = FetchSitemapResult {
            url: url.to_string(),
            links: Vec::new(),
        };

        let crawl = AssertUnwindSafe(self.coordinator.crawl(url.to_string(), &overrides));
        match crawl.catch_unwind().await {
            Ok(links) => result.links = links,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                if options.debug {
                    tracing::error!(url = %url, reason = %message, "Failed to fetch sitemap");
                }
                return Err(SitemapError::Orchestration {
                    url: url.to_string(),
                    message,
                });
            }
        }

        if options.debug {
            tracing::info!(
                url = %url,
                links = result.links.len(),
                errors = result.errors().count(),
                "Finished fetching sitemap"
            );
        }

        Ok(result)
    }
}
