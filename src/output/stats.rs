//! Statistics for a completed sitemap fetch
//!
//! This module provides functionality for summarizing and displaying
//! the outcome of a fetch.

use crate::model::{ErrorKind, FetchSitemapResult};
use std::collections::BTreeMap;

/// Fetch statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStatistics {
    /// Number of entries in the result
    pub total_links: u64,

    /// Page links resolved without error
    pub successful: u64,

    /// Sitemaps that could not be resolved
    pub failed: u64,

    /// Failure counts by kind
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,

    /// URLs of the sitemaps that failed, in result order
    pub failed_sitemaps: Vec<String>,
}

impl FetchStatistics {
    /// Summarizes a fetch result
    pub fn from_result(result: &FetchSitemapResult) -> Self {
        let mut stats = Self {
            total_links: result.links.len() as u64,
            ..Self::default()
        };

        for link in &result.links {
            match &link.error {
                Some(error) => {
                    stats.failed += 1;
                    *stats.errors_by_kind.entry(error.kind).or_insert(0) += 1;
                    stats.failed_sitemaps.push(link.loc.clone());
                }
                None => stats.successful += 1,
            }
        }

        stats
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// # Arguments
///
/// * `url` - The root sitemap URL
/// * `stats` - The statistics to display
pub fn print_statistics(url: &str, stats: &FetchStatistics) {
    eprintln!("=== Sitemap Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Root sitemap: {}", url);
    eprintln!("  Total entries: {}", stats.total_links);
    eprintln!("  Pages found: {}", stats.successful);
    eprintln!("  Failed sitemaps: {}", stats.failed);
    eprintln!();

    if !stats.errors_by_kind.is_empty() {
        eprintln!("Error Summary:");
        // Sort kinds by count (descending)
        let mut error_counts: Vec<_> = stats.errors_by_kind.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in error_counts {
            eprintln!("  {}: {}", kind, count);
        }
        eprintln!();

        eprintln!("Failed Sitemaps ({}):", stats.failed_sitemaps.len());
        for sitemap in &stats.failed_sitemaps {
            eprintln!("  - {}", sitemap);
        }
        eprintln!();
    }

    let success_rate = if stats.total_links > 0 {
        (stats.successful as f64 / stats.total_links as f64) * 100.0
    } else {
        0.0
    };

    eprintln!(
        "Success Rate: {:.1}% ({} / {} entries resolved)",
        success_rate, stats.successful, stats.total_links
    );
}
