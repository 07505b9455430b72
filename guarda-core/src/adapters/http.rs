//! Shared HTTP plumbing for collaborator clients

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use url::Url;

/// Build a blocking client that gives up after `timeout_secs`
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

/// Validate a collaborator base URL and strip trailing slashes
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim()).with_context(|| format!("Invalid URL format: '{}'", raw))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Unsupported URL scheme '{}' (expected http or https)", parsed.scheme());
    }
    if parsed.host_str().is_none() {
        anyhow::bail!("URL '{}' has no host", raw);
    }

    Ok(raw.trim().trim_end_matches('/').to_string())
}

/// Map request errors to messages that name the collaborator
pub fn map_request_error(service: &str, timeout_secs: u64, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        anyhow::anyhow!("{} request timed out after {} seconds", service, timeout_secs)
    } else if error.is_connect() {
        anyhow::anyhow!("Unable to connect to {}", service)
    } else {
        anyhow::anyhow!("{} request failed: {}", service, error)
    }
}
