//! Output module for rendering crawl results
//!
//! This module handles:
//! - Writing flattened links as plain text or JSON
//! - Summarizing a crawl into statistics

pub mod stats;

pub use stats::{print_statistics, FetchStatistics};

use crate::model::FetchSitemapResult;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to format output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Format used when writing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One URL per line, with lastmod tab-separated when known
    #[default]
    Text,
    /// The full result as pretty-printed JSON
    Json,
}

/// Writes a fetch result in the requested format
///
/// In text form, failed sitemaps are written as `!` lines carrying the URL,
/// the error kind and the message.
///
/// # Arguments
///
/// * `writer` - Destination for the output
/// * `result` - The result to render
/// * `format` - Text or JSON
pub fn write_results<W: Write>(
    writer: &mut W,
    result: &FetchSitemapResult,
    format: OutputFormat,
) -> OutputResult<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, result)?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            for link in &result.links {
                match (&link.error, &link.lastmod) {
                    (Some(error), _) => {
                        writeln!(writer, "! {}\t{}\t{}", link.loc, error.kind, error.message)?
                    }
                    (None, Some(lastmod)) => {
                        writeln!(writer, "{}\t{}", link.loc, lastmod.to_rfc3339())?
                    }
                    (None, None) => writeln!(writer, "{}", link.loc)?,
                }
            }
        }
    }

    writer.flush()?;
    Ok(())
}
