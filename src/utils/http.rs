// src/utils/http.rs

//! HTTP client utilities shared by the service and storage clients.

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::{AppError, Result};

const USER_AGENT: &str = concat!("reanalyzer/", env!("CARGO_PKG_VERSION"));

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Build an endpoint URL by appending percent-encoded path segments to `base`.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::config(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Short description of a failed response for error messages.
pub fn describe_failure(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        let snippet: String = body.chars().take(200).collect();
        format!("{status}: {snippet}")
    }
}
