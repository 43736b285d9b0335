//! Client for the WaveGate proxy endpoints

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use wgproxy::{Track, TrackPage};

/// Default proxy base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/audius";

/// Default timeout for metadata requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default trending page size
pub const DEFAULT_TRENDING_LIMIT: usize = 20;

/// Metadata and stream-URL source backing the playback controller
///
/// Track lists are pre-filtered to streamable tracks (those carrying a
/// content identifier); the controller never has to re-check.
#[async_trait]
pub trait StreamApi: Send + Sync {
    /// URL the sink should play for a track id
    fn stream_url(&self, track_id: &str) -> String;

    /// Trending tracks, streamable only
    async fn trending(&self, limit: Option<usize>) -> Result<Vec<Track>>;

    /// Search results, streamable only
    async fn search(&self, query: &str) -> Result<Vec<Track>>;

    /// Other tracks by the same artist, streamable only
    async fn artist_tracks(&self, user_id: &str) -> Result<Vec<Track>>;
}

/// HTTP implementation talking to the proxy's single GET surface
#[derive(Debug, Clone)]
pub struct HttpStreamApi {
    client: Client,
    base_url: String,
}

impl HttpStreamApi {
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpStreamApiBuilder {
        HttpStreamApiBuilder::default()
    }

    async fn fetch_tracks(&self, url: &str) -> Result<Vec<Track>> {
        debug!(url = %url, "Fetching track list");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::InvalidResponse(format!("proxy returned {status}")));
        }

        let body: serde_json::Value = response.json().await?;
        let page =
            TrackPage::from_value(body).map_err(|err| Error::InvalidResponse(err.to_string()))?;
        Ok(page.streamable())
    }
}

#[async_trait]
impl StreamApi for HttpStreamApi {
    fn stream_url(&self, track_id: &str) -> String {
        format!("{}?endpoint=/tracks/{}/stream", self.base_url, track_id)
    }

    async fn trending(&self, limit: Option<usize>) -> Result<Vec<Track>> {
        let limit = limit.unwrap_or(DEFAULT_TRENDING_LIMIT);
        let url = format!("{}?endpoint=/trending&limit={}", self.base_url, limit);
        self.fetch_tracks(&url).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let url = format!(
            "{}?endpoint=/tracks/search&q={}",
            self.base_url,
            urlencode(query)
        );
        self.fetch_tracks(&url).await
    }

    async fn artist_tracks(&self, user_id: &str) -> Result<Vec<Track>> {
        let url = format!("{}?endpoint=/users/{}/tracks", self.base_url, user_id);
        self.fetch_tracks(&url).await
    }
}

/// Minimal query-string escaping for the search term
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

/// Builder for configuring an [`HttpStreamApi`]
#[derive(Debug)]
pub struct HttpStreamApiBuilder {
    client: Option<Client>,
    base_url: String,
    timeout: Duration,
}

impl Default for HttpStreamApiBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HttpStreamApiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the proxy base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// Set the metadata request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpStreamApi> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder().timeout(self.timeout).build()?,
        };

        Ok(HttpStreamApi {
            client,
            base_url: self.base_url,
        })
    }
}
