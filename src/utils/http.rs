// src/utils/http.rs

//! HTTP client utilities.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::ForumConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &ForumConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(build_headers(config)?)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Turn the configured extra headers into a header map.
pub fn build_headers(config: &ForumConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("Invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("Invalid value for header '{name}': {e}")))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
