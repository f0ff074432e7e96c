use crate::config::types::Config;
use crate::options::FetchOptions;
use crate::ConfigError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_options(&config.fetch_options())
}

/// Validates crawl options
pub fn validate_fetch_options(options: &FetchOptions) -> Result<(), ConfigError> {
    if options.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout-ms must be greater than 0".to_string(),
        ));
    }

    if options.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            options.max_retries
        )));
    }

    if let Some(headers) = &options.request_headers {
        build_header_map(headers)?;
    }

    Ok(())
}

/// Converts a name/value table into a header map, rejecting invalid entries
pub fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| {
            ConfigError::InvalidHeader(format!("'{}' is not a valid header name", name))
        })?;
        let header_value = HeaderValue::from_str(value.trim()).map_err(|_| {
            ConfigError::InvalidHeader(format!("value for '{}' contains invalid characters", name))
        })?;
        map.insert(header_name, header_value);
    }

    Ok(map)
}

/// Splits a `Name: value` header line as given on the command line
pub fn parse_header_line(line: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = line.split_once(':').ok_or_else(|| {
        ConfigError::InvalidHeader(format!("expected 'Name: value', got '{}'", line))
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidHeader(format!(
            "missing header name in '{}'",
            line
        )));
    }

    Ok((name.to_string(), value.trim().to_string()))
}
