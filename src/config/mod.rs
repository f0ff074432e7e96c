//! Configuration module for Sitemap-Flattener
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_flattener::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemap.toml")).unwrap();
//! println!("Requests time out after {}ms", config.fetch.timeout_ms);
//! ```

mod parser;
mod types;
pub(crate) mod validation;

// Re-export types
pub use types::{Config, FetchConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::parse_header_line;
