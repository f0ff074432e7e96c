//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client
//! - Injecting default request headers below caller-supplied ones
//! - Enforcing the per-request deadline
//! - Error classification (network / timeout / HTTP status)

use crate::options::{FetchOptions, RequestOverrides};
use crate::FetchError;
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method};

/// User agent sent when the caller does not supply one
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/77.0.3865.90 Safari/537.36";

/// Accept-Encoding sent when the caller does not supply one
pub const DEFAULT_ACCEPT_ENCODING: &str = "gzip";

/// Content-Type sent when the caller does not supply one
pub const DEFAULT_CONTENT_TYPE: &str = "application/xml";

/// A fully prepared request handed to a [`Transport`]
#[derive(Debug, Clone)]
pub struct SitemapRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Raw response returned by a [`Transport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Final HTTP status code
    pub status: u16,

    /// Undecoded body bytes
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The capability to perform one HTTP exchange
///
/// Implementations report connection-level failures as
/// [`FetchError::Network`] and return every received response, whatever its
/// status. A [`FetchError::Timeout`] from the transport is reported with the
/// configured deadline.
pub trait Transport: Send + Sync {
    fn send(&self, request: SitemapRequest) -> BoxFuture<'_, Result<RawResponse, FetchError>>;
}

/// [`Transport`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: SitemapRequest) -> BoxFuture<'_, Result<RawResponse, FetchError>> {
        async move {
            let SitemapRequest {
                url,
                method,
                headers,
                body,
            } = request;

            let mut builder = self.client.request(method, &url).headers(headers);
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| classify_error(&url, e))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| classify_error(&url, e))?;

            Ok(RawResponse {
                status,
                body: body.to_vec(),
            })
        }
        .boxed()
    }
}

/// Builds an HTTP client for sitemap fetching
///
/// The user agent and encoding headers are set per request, so the client
/// carries no defaults of its own. Gzip bodies sent with
/// `Content-Encoding: gzip` are decoded by the client; raw `.xml.gz` files are
/// handled by the document parser.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .gzip(true)
        .brotli(true)
        .build()
}

/// Merges default headers below construction-level and per-call headers
///
/// Precedence: per-call overrides, then construction-level headers, then the
/// injected defaults for `User-Agent`, `Accept-Encoding` and `Content-Type`.
pub fn build_headers(base: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut headers = base.clone();
    for (name, value) in overrides {
        headers.insert(name.clone(), value.clone());
    }

    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }
    if !headers.contains_key(ACCEPT_ENCODING) {
        headers.insert(
            ACCEPT_ENCODING,
            HeaderValue::from_static(DEFAULT_ACCEPT_ENCODING),
        );
    }
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }

    headers
}

/// Performs a single request for a sitemap URL
///
/// # Request Flow
///
/// 1. Merge headers (see [`build_headers`])
/// 2. Send through the transport with a deadline of `options.timeout_ms`
/// 3. Classify the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | Deadline fired | `FetchError::Timeout` (in-flight request dropped) |
/// | Status outside 2xx | `FetchError::Http` |
/// | Connection / DNS / TLS failure | `FetchError::Network` |
///
/// # Arguments
///
/// * `transport` - The transport to send through
/// * `url` - The sitemap URL
/// * `options` - Crawl options (timeout)
/// * `base_headers` - Construction-level headers
/// * `overrides` - Per-call method, headers and body
pub async fn fetch_once(
    transport: &dyn Transport,
    url: &str,
    options: &FetchOptions,
    base_headers: &HeaderMap,
    overrides: &RequestOverrides,
) -> Result<RawResponse, FetchError> {
    let request = SitemapRequest {
        url: url.to_string(),
        method: overrides.method.clone().unwrap_or(Method::GET),
        headers: build_headers(base_headers, &overrides.headers),
        body: overrides.body.clone(),
    };

    let response = match tokio::time::timeout(options.timeout(), transport.send(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(FetchError::Timeout { .. })) | Err(_) => {
            return Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: options.timeout_ms,
            })
        }
        Ok(Err(error)) => return Err(error),
    };

    if !response.is_success() {
        return Err(FetchError::Http {
            url: url.to_string(),
            status: response.status,
        });
    }

    Ok(response)
}

/// Classifies a reqwest failure
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: 0,
        }
    } else if let Some(status) = error.status() {
        FetchError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
