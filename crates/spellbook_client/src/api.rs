//! Async API surface used by the sync orchestrator, plus its HTTP implementation.

use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use spellbook_core::models::{Spell, SpellDraft, SpellListResponse, SpellPatch, TrashEntry};
use std::time::Duration;

/// Remote record-store operations.
///
/// Implemented over HTTP by [`HttpSpellApi`]; tests substitute in-process fakes.
#[async_trait]
pub trait SpellApi: Send + Sync {
    async fn list(&self, limit: usize, offset: usize) -> Result<SpellListResponse, ClientError>;

    async fn get(&self, id: &str) -> Result<Spell, ClientError>;

    async fn create(&self, draft: &SpellDraft) -> Result<Spell, ClientError>;

    async fn update(&self, id: &str, patch: &SpellPatch) -> Result<Spell, ClientError>;

    /// Move a spell to the trash; returns the record as it was.
    async fn delete(&self, id: &str) -> Result<Spell, ClientError>;

    async fn list_trash(&self) -> Result<Vec<TrashEntry>, ClientError>;

    async fn restore(&self, id: &str) -> Result<Spell, ClientError>;
}

/// Extract a human-readable message from an error response body.
///
/// Prefers the `error` field of a JSON body, then the raw body, then the
/// status reason phrase.
pub fn error_message_for_response(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

/// Append percent-encoded path segments to `base`.
///
/// # Errors
/// Returns [`ClientError::InvalidUrl`] when `base` does not parse or cannot
/// carry a path.
pub fn api_url(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = Url::parse(base)
        .map_err(|err| ClientError::InvalidUrl(format!("'{}': {}", base, err)))?;
    let mut path = url.path_segments_mut().map_err(|_| {
        ClientError::InvalidUrl(format!("'{}' cannot be used as an API base", base))
    })?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

/// [`SpellApi`] over the Spellbook REST surface.
#[derive(Debug, Clone)]
pub struct HttpSpellApi {
    client: reqwest::Client,
    base: String,
}

impl HttpSpellApi {
    /// Build a client for `base` with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error when `base` is not a usable URL or the HTTP client
    /// cannot be constructed.
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base = base.into();
        api_url(&base, &[])?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        api_url(&self.base, segments)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => format!("failed to read error response body: {}", err),
            };
            let message = error_message_for_response(status, &body);
            tracing::debug!("API request failed ({}): {}", status, message);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpellApi for HttpSpellApi {
    async fn list(&self, limit: usize, offset: usize) -> Result<SpellListResponse, ClientError> {
        let url = self.url(&["spells"])?;
        let request = self
            .client
            .get(url)
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(request).await
    }

    async fn get(&self, id: &str) -> Result<Spell, ClientError> {
        let url = self.url(&["spells", id])?;
        self.send_json(self.client.get(url)).await
    }

    async fn create(&self, draft: &SpellDraft) -> Result<Spell, ClientError> {
        let url = self.url(&["spells"])?;
        self.send_json(self.client.post(url).json(draft)).await
    }

    async fn update(&self, id: &str, patch: &SpellPatch) -> Result<Spell, ClientError> {
        let url = self.url(&["spells", id])?;
        self.send_json(self.client.put(url).json(patch)).await
    }

    async fn delete(&self, id: &str) -> Result<Spell, ClientError> {
        let url = self.url(&["spells", id])?;
        self.send_json(self.client.delete(url)).await
    }

    async fn list_trash(&self) -> Result<Vec<TrashEntry>, ClientError> {
        let url = self.url(&["trash"])?;
        self.send_json(self.client.get(url)).await
    }

    async fn restore(&self, id: &str) -> Result<Spell, ClientError> {
        let url = self.url(&["trash", id, "restore"])?;
        self.send_json(self.client.post(url)).await
    }
}
