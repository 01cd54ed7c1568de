//! API base URL resolution for local and deployed environments.

use crate::error::ClientError;
use spellbook_core::DEFAULT_CLIENT_API_URL;

/// Explicit API base URL (also read by the CLI's `--server` flag).
pub const API_URL_ENV: &str = "SPELLBOOK_API_URL";
/// Environment selector; `deployed` switches to [`DEPLOYED_URL_ENV`].
pub const ENVIRONMENT_ENV: &str = "SPELLBOOK_ENV";
/// Base URL used when [`ENVIRONMENT_ENV`] is `deployed`.
pub const DEPLOYED_URL_ENV: &str = "SPELLBOOK_DEPLOYED_URL";

/// Where the resolved base URL came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEndpoint {
    Explicit(String),
    Deployed(String),
    Local,
}

impl ApiEndpoint {
    /// Normalized base URL for this endpoint.
    pub fn base_url(&self) -> String {
        match self {
            ApiEndpoint::Explicit(url) | ApiEndpoint::Deployed(url) => normalize_base_url(url),
            ApiEndpoint::Local => normalize_base_url(DEFAULT_CLIENT_API_URL),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_deployed(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "deployed" | "production" | "prod"
    )
}

/// Pick the API endpoint: an explicit URL wins, then the deployed endpoint
/// when the environment asks for it, then the local default.
///
/// # Errors
/// Returns [`ClientError::InvalidUrl`] when the deployed environment is
/// selected without a deployed URL.
pub fn resolve_endpoint<F>(explicit: Option<String>, lookup: F) -> Result<ApiEndpoint, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_blank(explicit) {
        return Ok(ApiEndpoint::Explicit(url));
    }
    match lookup(ENVIRONMENT_ENV) {
        Some(env) if is_deployed(&env) => match non_blank(lookup(DEPLOYED_URL_ENV)) {
            Some(url) => Ok(ApiEndpoint::Deployed(url)),
            None => Err(ClientError::InvalidUrl(format!(
                "{}={} requires {} to be set",
                ENVIRONMENT_ENV,
                env.trim(),
                DEPLOYED_URL_ENV
            ))),
        },
        _ => Ok(ApiEndpoint::Local),
    }
}

/// Strip trailing slashes and pin plain-http `localhost` to `127.0.0.1`.
pub fn normalize_base_url(server: &str) -> String {
    let server = server.trim();
    if let Ok(mut url) = reqwest::Url::parse(server) {
        let pin_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if pin_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server.to_string();
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server.to_string()
}
