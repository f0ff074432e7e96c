//! Sitemap document parser
//!
//! This module turns a raw response body into a [`ParsedDocument`]:
//! - Gzip bodies are decompressed first
//! - The root element decides between a sitemap index and a url set
//! - Repeated child elements are always collected into a sequence
//! - `lastmod` values are parsed into UTC timestamps; unreadable ones are
//!   kept apart from missing ones

use crate::crawler::gzip::{gunzip, is_gzip};
use crate::FetchError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

/// The `lastmod` of a sitemap entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lastmod {
    /// The entry has no `<lastmod>` element
    #[default]
    Missing,
    Valid(DateTime<Utc>),
    /// The element is present but is not a W3C datetime
    Unparseable(String),
}

impl Lastmod {
    /// Interprets the raw text of a `<lastmod>` element
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Missing,
            Some(text) => match parse_lastmod(text) {
                Some(timestamp) => Self::Valid(timestamp),
                None => Self::Unparseable(text.to_string()),
            },
        }
    }

    /// Returns the timestamp, if one could be read
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Valid(timestamp) => Some(*timestamp),
            _ => None,
        }
    }
}

/// A reference to a child sitemap listed in a sitemap index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapRef {
    pub loc: String,
    pub lastmod: Lastmod,
}

/// A page listed in a url set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRef {
    pub loc: String,
    pub lastmod: Lastmod,
    pub changefreq: Option<String>,
    pub priority: Option<String>,
}

/// A successfully parsed sitemap document
///
/// Exactly one shape per document; the entry list is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDocument {
    SitemapIndex(Vec<SitemapRef>),
    UrlSet(Vec<UrlRef>),
}

impl ParsedDocument {
    /// Number of entries in the document
    pub fn len(&self) -> usize {
        match self {
            Self::SitemapIndex(entries) => entries.len(),
            Self::UrlSet(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
struct SitemapIndexXml {
    #[serde(rename = "sitemap", default)]
    sitemaps: Vec<EntryXml>,
}

#[derive(Debug, Deserialize)]
struct UrlSetXml {
    #[serde(rename = "url", default)]
    urls: Vec<EntryXml>,
}

#[derive(Debug, Deserialize)]
struct EntryXml {
    #[serde(default)]
    loc: Option<String>,
    #[serde(default)]
    lastmod: Option<String>,
    #[serde(default)]
    changefreq: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

impl EntryXml {
    /// Returns the trimmed location, or None if the entry has none
    fn location(&self) -> Option<String> {
        self.loc
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(str::to_string)
    }

    fn modified(&self) -> Lastmod {
        Lastmod::parse(self.lastmod.as_deref())
    }
}

/// Parses a response body into a sitemap document
///
/// # Arguments
///
/// * `body` - Raw response bytes, optionally gzip-compressed
///
/// # Returns
///
/// * `Ok(ParsedDocument)` - A sitemap index or url set with at least one entry
/// * `Err(FetchError::Decompression)` - Body looked like gzip but was corrupt
/// * `Err(FetchError::Parse)` - Body was not well-formed XML
/// * `Err(FetchError::InvalidSitemap)` - Document matched neither shape
///
/// # Example
///
/// ```
/// use sitemap_flattener::crawler::{parse_document, ParsedDocument};
///
/// let xml = br#"<urlset><url><loc>https://example.com/</loc></url></urlset>"#;
/// let document = parse_document(xml).unwrap();
/// assert!(matches!(document, ParsedDocument::UrlSet(ref urls) if urls.len() == 1));
/// ```
pub fn parse_document(body: &[u8]) -> Result<ParsedDocument, FetchError> {
    let decompressed;
    let bytes = if is_gzip(body) {
        decompressed = gunzip(body)?;
        decompressed.as_slice()
    } else {
        body
    };

    let text = String::from_utf8_lossy(bytes);
    let xml = text.trim_start_matches('\u{feff}');

    match root_element(xml)?.as_deref() {
        Some("sitemapindex") => {
            let index: SitemapIndexXml =
                quick_xml::de::from_str(xml).map_err(|e| FetchError::Parse(e.to_string()))?;

            let entries: Vec<SitemapRef> = index
                .sitemaps
                .iter()
                .filter_map(|entry| {
                    entry.location().map(|loc| SitemapRef {
                        loc,
                        lastmod: entry.modified(),
                    })
                })
                .collect();

            if entries.is_empty() {
                return Err(FetchError::InvalidSitemap(
                    "sitemapindex lists no sitemaps".to_string(),
                ));
            }
            Ok(ParsedDocument::SitemapIndex(entries))
        }
        Some("urlset") => {
            let set: UrlSetXml =
                quick_xml::de::from_str(xml).map_err(|e| FetchError::Parse(e.to_string()))?;

            let entries: Vec<UrlRef> = set
                .urls
                .into_iter()
                .filter_map(|entry| {
                    let loc = entry.location()?;
                    let lastmod = entry.modified();
                    Some(UrlRef {
                        loc,
                        lastmod,
                        changefreq: entry.changefreq,
                        priority: entry.priority,
                    })
                })
                .collect();

            if entries.is_empty() {
                return Err(FetchError::InvalidSitemap(
                    "urlset lists no urls".to_string(),
                ));
            }
            Ok(ParsedDocument::UrlSet(entries))
        }
        Some(other) => Err(FetchError::InvalidSitemap(format!(
            "unexpected root element <{}>",
            other
        ))),
        None => Err(FetchError::InvalidSitemap(
            "document has no root element".to_string(),
        )),
    }
}

/// Finds the local name of the document's root element
fn root_element(xml: &str) -> Result<Option<String>, FetchError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                return Ok(Some(name));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(FetchError::Parse(e.to_string())),
            _ => {}
        }
    }
}

/// Parses a W3C datetime `lastmod` value into UTC
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, and date-times with minute,
/// second or fractional-second precision. Date-times carry `Z`, a numeric
/// offset, or no offset at all (read as UTC). Returns None for anything else.
pub fn parse_lastmod(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    // Minute precision: 2024-01-01T10:30+02:00 / 2024-01-01T10:30Z
    let offset_form = match raw.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => raw.to_string(),
    };
    if let Ok(parsed) = DateTime::parse_from_str(&offset_form, "%Y-%m-%dT%H:%M%:z") {
        return Some(parsed.with_timezone(&Utc));
    }

    // Date-times without an offset are taken as UTC
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    let date = match raw.len() {
        4 => format!("{}-01-01", raw),
        7 => format!("{}-01", raw),
        _ => raw.to_string(),
    };
    NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}
