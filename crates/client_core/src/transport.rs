//! Remote store access: the `EntryApi` seam and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CACHE_CONTROL, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Entry, EntryDraft, EntryId},
    error::ApiError,
    protocol::{
        HealthResponse, StatsResponse, CACHE_MARKER_HEADER, ENTRIES_PATH, HEALTH_PATH, STATS_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::error::SyncError;

/// Result of a list fetch: the entries plus the raw cache marker, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryListing {
    pub entries: Vec<Entry>,
    pub cache_marker: Option<String>,
}

#[async_trait]
pub trait EntryApi: Send + Sync {
    async fn list_entries(&self) -> Result<EntryListing, SyncError>;
    async fn create_entry(&self, draft: &EntryDraft) -> Result<(), SyncError>;
    async fn update_entry(&self, id: EntryId, draft: &EntryDraft) -> Result<(), SyncError>;
    async fn delete_entry(&self, id: EntryId) -> Result<(), SyncError>;
    async fn fetch_stats(&self) -> Result<StatsResponse, SyncError>;
    async fn fetch_health(&self) -> Result<HealthResponse, SyncError>;
}

pub struct HttpEntryApi {
    http: Client,
    base_url: Url,
}

impl HttpEntryApi {
    pub fn new(server_url: &str) -> Result<Self, SyncError> {
        Self::with_timeout(server_url, None)
    }

    pub fn with_timeout(server_url: &str, timeout: Option<Duration>) -> Result<Self, SyncError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, parse_base_url(server_url)?))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn entry_endpoint(&self, id: EntryId) -> Result<Url, SyncError> {
        self.endpoint(&format!("{ENTRIES_PATH}/{id}"))
    }
}

/// Keeps any path prefix of the server url when joining endpoint paths.
fn parse_base_url(server_url: &str) -> Result<Url, SyncError> {
    let trimmed = server_url.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Status(ApiError::new(status.as_u16(), body)))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SyncError::Decode(e.to_string()))
}

#[async_trait]
impl EntryApi for HttpEntryApi {
    async fn list_entries(&self) -> Result<EntryListing, SyncError> {
        let response = self
            .http
            .get(self.endpoint(ENTRIES_PATH)?)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let cache_marker = response
            .headers()
            .get(CACHE_MARKER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!(cache_marker = ?cache_marker, "received entry listing");
        let entries: Vec<Entry> = decode_json(response).await?;
        Ok(EntryListing {
            entries,
            cache_marker,
        })
    }

    async fn create_entry(&self, draft: &EntryDraft) -> Result<(), SyncError> {
        let response = self
            .http
            .post(self.endpoint(ENTRIES_PATH)?)
            .json(draft)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update_entry(&self, id: EntryId, draft: &EntryDraft) -> Result<(), SyncError> {
        let response = self
            .http
            .put(self.entry_endpoint(id)?)
            .json(draft)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_entry(&self, id: EntryId) -> Result<(), SyncError> {
        // 204 No Content falls inside the 2xx range.
        let response = self.http.delete(self.entry_endpoint(id)?).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_stats(&self) -> Result<StatsResponse, SyncError> {
        let response = self.http.get(self.endpoint(STATS_PATH)?).send().await?;
        decode_json(ensure_success(response).await?).await
    }

    async fn fetch_health(&self) -> Result<HealthResponse, SyncError> {
        let response = self.http.get(self.endpoint(HEALTH_PATH)?).send().await?;
        decode_json(ensure_success(response).await?).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
