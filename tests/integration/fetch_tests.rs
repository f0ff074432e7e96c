//! Integration tests for the sitemap fetcher
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full fetch cycle end-to-end.

use flate2::write::GzEncoder;
use flate2::Compression;
use sitemap_flattener::model::ErrorKind;
use sitemap_flattener::{FetchOptions, RequestOverrides, Sitemapper};
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Options with a short backoff so retry tests stay fast
fn test_options(max_retries: u32) -> FetchOptions {
    FetchOptions {
        timeout_ms: 2_000,
        max_retries,
        initial_backoff: Duration::from_millis(10),
        ..FetchOptions::default()
    }
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

fn index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

fn gzip(body: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).expect("Failed to compress");
    encoder.finish().expect("Failed to finish gzip stream")
}

async fn mount_xml(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sitemap_index_is_flattened() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap.xml",
        index(&[
            format!("{}/posts.xml", base_url),
            format!("{}/pages.xml", base_url),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/posts.xml",
        urlset(&[
            format!("{}/posts/1", base_url),
            format!("{}/posts/2", base_url),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/pages.xml",
        urlset(&[format!("{}/about", base_url)]),
    )
    .await;

    let sitemapper = Sitemapper::new(test_options(3)).expect("Failed to create sitemapper");
    let root = format!("{}/sitemap.xml", base_url);
    let result = sitemapper.fetch(&root, None).await.expect("Fetch failed");

    assert_eq!(result.url, root);
    let locs: Vec<String> = result.links.iter().map(|link| link.loc.clone()).collect();
    assert_eq!(
        locs,
        vec![
            format!("{}/posts/1", base_url),
            format!("{}/posts/2", base_url),
            format!("{}/about", base_url),
        ]
    );
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_failed_child_is_reported_in_place() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap.xml",
        index(&[
            format!("{}/a.xml", base_url),
            format!("{}/b.xml", base_url),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/a.xml",
        urlset(&[format!("{}/a1", base_url), format!("{}/a2", base_url)]),
    )
    .await;

    // b.xml fails on every attempt
    Mock::given(method("GET"))
        .and(path("/b.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let sitemapper = Sitemapper::new(test_options(2)).expect("Failed to create sitemapper");
    let result = sitemapper
        .fetch(&format!("{}/sitemap.xml", base_url), None)
        .await
        .expect("Fetch failed");

    assert_eq!(result.links.len(), 3);
    assert_eq!(result.links[0].loc, format!("{}/a1", base_url));
    assert_eq!(result.links[1].loc, format!("{}/a2", base_url));
    assert_eq!(result.links[2].loc, format!("{}/b.xml", base_url));

    let error = result.links[2].error.as_ref().expect("Expected an error");
    assert_eq!(error.kind, ErrorKind::Http);
    assert_eq!(error.message, "HTTP Error: 500");
    assert_eq!(error.retries_exhausted, Some(2));

    // Wiremock verifies the expected request count when mock_server drops
}

#[tokio::test]
async fn test_gzip_file_is_decompressed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(&urlset(&[format!("{}/compressed", base_url)])))
                .insert_header("content-type", "application/x-gzip"),
        )
        .mount(&mock_server)
        .await;

    let sitemapper = Sitemapper::new(test_options(1)).expect("Failed to create sitemapper");
    let result = sitemapper
        .fetch(&format!("{}/sitemap.xml.gz", base_url), None)
        .await
        .expect("Fetch failed");

    assert_eq!(result.links.len(), 1);
    assert_eq!(result.links[0].loc, format!("{}/compressed", base_url));
    assert!(result.links[0].error.is_none());
}

#[tokio::test]
async fn test_gzip_content_encoding_is_decoded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(&urlset(&[format!("{}/encoded", base_url)])))
                .insert_header("content-type", "application/xml")
                .insert_header("content-encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let sitemapper = Sitemapper::new(test_options(1)).expect("Failed to create sitemapper");
    let result = sitemapper
        .fetch(&format!("{}/sitemap.xml", base_url), None)
        .await
        .expect("Fetch failed");

    assert_eq!(result.links.len(), 1);
    assert_eq!(result.links[0].loc, format!("{}/encoded", base_url));
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .and(header_exists("user-agent"))
        .and(header("accept-encoding", "gzip"))
        .and(header("content-type", "application/xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(urlset(&[format!("{}/", base_url)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let sitemapper = Sitemapper::new(test_options(1)).expect("Failed to create sitemapper");
    let result = sitemapper
        .fetch(&format!("{}/sitemap.xml", base_url), None)
        .await
        .expect("Fetch failed");

    assert!(result.is_complete());
}

#[tokio::test]
async fn test_caller_headers_override_defaults() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header("x-api-key", "secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(urlset(&[format!("{}/", base_url)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut request_headers = std::collections::BTreeMap::new();
    request_headers.insert("X-Api-Key".to_string(), "secret".to_string());
    request_headers.insert("User-Agent".to_string(), "ConfigBot/1.0".to_string());
    let options = FetchOptions {
        request_headers: Some(request_headers),
        ..test_options(1)
    };

    let mut call_headers = std::collections::BTreeMap::new();
    call_headers.insert("User-Agent".to_string(), "TestBot/1.0".to_string());
    let overrides = RequestOverrides::from_headers(&call_headers).expect("Invalid headers");

    let sitemapper = Sitemapper::new(options).expect("Failed to create sitemapper");
    let result = sitemapper
        .fetch(&format!("{}/sitemap.xml", base_url), Some(overrides))
        .await
        .expect("Fetch failed");

    assert!(result.is_complete());
}

#[tokio::test]
async fn test_slow_sitemap_times_out() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset(&[format!("{}/", base_url)]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let options = FetchOptions {
        timeout_ms: 200,
        ..test_options(1)
    };
    let sitemapper = Sitemapper::new(options).expect("Failed to create sitemapper");
    let url = format!("{}/slow.xml", base_url);
    let result = sitemapper.fetch(&url, None).await.expect("Fetch failed");

    assert_eq!(result.links.len(), 1);
    let error = result.links[0].error.as_ref().expect("Expected an error");
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(
        error.message,
        format!("Request timed out after 200 milliseconds for url: '{}'", url)
    );
    assert_eq!(error.retries_exhausted, Some(1));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Reserve a port, then release it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);

    let url = format!("http://127.0.0.1:{}/sitemap.xml", port);
    let links = sitemap_flattener::crawler::crawl(&url, test_options(2))
        .await
        .expect("Crawl setup failed");

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].loc, url);
    let error = links[0].error.as_ref().expect("Expected an error");
    assert_eq!(error.kind, ErrorKind::Network);
    assert_eq!(error.retries_exhausted, Some(2));
}

#[tokio::test]
async fn test_non_sitemap_document_is_invalid() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Home</title></head><body></body></html>")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let sitemapper = Sitemapper::new(test_options(3)).expect("Failed to create sitemapper");
    let result = sitemapper
        .fetch(&format!("{}/", base_url), None)
        .await
        .expect("Fetch failed");

    assert_eq!(result.links.len(), 1);
    assert_eq!(
        result.links[0].error.as_ref().map(|error| error.kind),
        Some(ErrorKind::InvalidSitemap)
    );
}

#[tokio::test]
async fn test_lastmod_cutoff_skips_stale_sitemaps() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap.xml",
        format!(
            "<sitemapindex>\
             <sitemap><loc>{base}/old.xml</loc><lastmod>2020-01-01</lastmod></sitemap>\
             <sitemap><loc>{base}/new.xml</loc><lastmod>2025-01-01</lastmod></sitemap>\
             </sitemapindex>",
            base = base_url
        ),
    )
    .await;
    mount_xml(
        &mock_server,
        "/new.xml",
        urlset(&[format!("{}/fresh", base_url)]),
    )
    .await;

    // The stale child must never be requested
    Mock::given(method("GET"))
        .and(path("/old.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let options = FetchOptions {
        lastmod: Some(
            chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .expect("Invalid cutoff")
                .with_timezone(&chrono::Utc),
        ),
        ..test_options(1)
    };
    let sitemapper = Sitemapper::new(options).expect("Failed to create sitemapper");
    let result = sitemapper
        .fetch(&format!("{}/sitemap.xml", base_url), None)
        .await
        .expect("Fetch failed");

    assert_eq!(result.links.len(), 1);
    assert_eq!(result.links[0].loc, format!("{}/fresh", base_url));
}
