//! Failover request routing
//!
//! Every read path must assume any single discovery node can be down, slow
//! or rate-limiting, so trending, search and stream are host-failover loops
//! rather than single calls: `START -> TRY_CANDIDATE[i] -> SUCCESS | FAIL ->
//! TRY_CANDIDATE[i+1]`, terminal failure when the candidate list is
//! exhausted. Candidates are tried in declared priority order (flagship
//! hosts before the dynamically selected one), never randomly.

use crate::error::{Error, Result};
use crate::hosts::{HostSelector, DEFAULT_USER_AGENT};
use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Flagship hosts tried before the dynamically selected one
pub const FLAGSHIP_HOSTS: &[&str] = &[
    "https://api.audius.co",
    "https://discoveryprovider.audius.co",
    "https://discoveryprovider1.audius.co",
    "https://audius-discovery-1.audius.co",
];

/// Gateway tried first for search requests
pub const GATEWAY_HOST: &str = "https://api.audius.co";

/// Default trending page size
pub const DEFAULT_TRENDING_LIMIT: usize = 20;

/// Hard cap on the trending page size
pub const MAX_TRENDING_LIMIT: usize = 100;

/// Default `app_name` query parameter sent upstream
pub const DEFAULT_APP_NAME: &str = "audius-player";

/// Timeout for stream fetches (the audio payload, not metadata)
pub const STREAM_TIMEOUT_SECS: u64 = 10;

/// The four logical request shapes the proxy understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `/trending` (normalized to `/tracks/trending`)
    Trending,
    /// `/tracks/search`
    Search,
    /// `/tracks/{id}/stream`
    Stream,
    /// Anything else: single-shot forward to the selected host
    Passthrough,
}

impl RequestKind {
    /// Classify a logical endpoint path
    pub fn from_endpoint(endpoint: &str) -> Self {
        if endpoint == "/trending" || endpoint == "/tracks/trending" {
            RequestKind::Trending
        } else if endpoint.starts_with("/tracks/search") {
            RequestKind::Search
        } else if endpoint.starts_with("/tracks/") && endpoint.contains("/stream") {
            RequestKind::Stream
        } else {
            RequestKind::Passthrough
        }
    }
}

/// A relayed binary payload: exact upstream content type and bytes
#[derive(Debug, Clone)]
pub struct StreamPayload {
    pub content_type: String,
    pub body: Bytes,
}

/// Routes logical requests across candidate discovery hosts
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use wgproxy::{FailoverRouter, HostSelector};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let hosts = Arc::new(HostSelector::new()?);
///     let router = FailoverRouter::builder().hosts(hosts).build()?;
///     let trending = router.trending(Some(10)).await?;
///     println!("{} trending tracks", trending["data"].as_array().map_or(0, |a| a.len()));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FailoverRouter {
    client: Client,
    hosts: Arc<HostSelector>,
    flagship_hosts: Vec<String>,
    gateway_host: String,
    app_name: String,
    default_limit: usize,
}

impl FailoverRouter {
    /// Create a builder for configuring the router
    pub fn builder() -> FailoverRouterBuilder {
        FailoverRouterBuilder::default()
    }

    /// The host selector backing this router
    pub fn hosts(&self) -> &Arc<HostSelector> {
        &self.hosts
    }

    /// Ordered candidate list for trending/stream: flagship hosts first,
    /// then the selected host; deduplicated, empty entries removed.
    async fn candidate_hosts(&self) -> Result<Vec<String>> {
        let selected = self.hosts.select().await?;

        let mut candidates = self.flagship_hosts.clone();
        candidates.push(selected);
        candidates.retain(|host| !host.is_empty());

        let mut seen = Vec::with_capacity(candidates.len());
        for host in candidates {
            if !seen.contains(&host) {
                seen.push(host);
            }
        }
        Ok(seen)
    }

    /// Fetch trending tracks, failing over across candidate hosts
    ///
    /// The first candidate answering 2xx with valid JSON wins and its body
    /// is returned unmodified. Exhaustion carries the last observed error.
    pub async fn trending(&self, limit: Option<usize>) -> Result<serde_json::Value> {
        let limit = limit.unwrap_or(self.default_limit).min(MAX_TRENDING_LIMIT);
        let candidates = self.candidate_hosts().await?;

        let mut last_error = String::new();
        for host in &candidates {
            let url = format!(
                "{}/v1/tracks/trending?limit={}&app_name={}",
                host, limit, self.app_name
            );
            debug!(url = %url, "Trying trending host");

            match self.fetch_json(&url).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    last_error = format!("Host {} failed: {}", host, err);
                    debug!(host = %host, error = %err, "Trending host failed");
                }
            }
        }

        warn!(last_error = %last_error, "All trending hosts failed");
        Err(Error::TrendingUnavailable { last_error })
    }

    /// Search tracks, trying the gateway first and the selected host second
    ///
    /// An empty or whitespace-only query fails fast with
    /// [`Error::MissingQuery`] and issues zero network calls. The two-source
    /// candidate list (narrower than trending/stream) is deliberate; see
    /// DESIGN.md.
    pub async fn search(&self, query: &str) -> Result<serde_json::Value> {
        if query.trim().is_empty() {
            return Err(Error::MissingQuery);
        }

        let selected = self.hosts.select().await?;
        let mut sources = vec![self.gateway_host.clone(), selected];
        sources.retain(|host| !host.is_empty());
        sources.dedup();

        for host in &sources {
            let url = format!("{}/v1/tracks/search", host);
            debug!(url = %url, query = %query, "Trying search source");

            let request = self
                .client
                .get(&url)
                .query(&[("query", query), ("app_name", self.app_name.as_str())])
                .header("Accept", "application/json");

            match Self::json_from_response(request.send().await).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    debug!(host = %host, error = %err, "Search source failed");
                }
            }
        }

        warn!(query = %query, "All search sources failed");
        Err(Error::SearchUnavailable)
    }

    /// Relay a stream endpoint (`/tracks/{id}/stream`), failing over across
    /// candidate hosts
    ///
    /// The request carries audio accept headers and a real timeout; on
    /// success the exact upstream content type and raw bytes are relayed
    /// unchanged (binary passthrough, no JSON parsing).
    pub async fn stream(&self, endpoint: &str) -> Result<StreamPayload> {
        let candidates = self.candidate_hosts().await?;

        let mut last_error = String::new();
        for host in &candidates {
            let url = format!("{}/v1{}?app_name={}", host, endpoint, self.app_name);
            debug!(url = %url, "Trying stream host");

            match self.fetch_stream(&url).await {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    last_error = format!("Host {} failed: {}", host, err);
                    debug!(host = %host, error = %err, "Stream host failed");
                }
            }
        }

        warn!(last_error = %last_error, "All stream hosts failed");
        Err(Error::StreamUnavailable { last_error })
    }

    /// Forward any other endpoint once to the selected host
    ///
    /// Non-success statuses are relayed verbatim as
    /// [`Error::UpstreamStatus`]; a 2xx body that is not valid JSON is the
    /// distinct [`Error::InvalidPayload`].
    pub async fn passthrough(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<serde_json::Value> {
        let host = self.hosts.select().await?;
        let url = format!("{}/v1{}", host, endpoint);
        debug!(url = %url, "Passthrough fetch");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("app_name", self.app_name.as_str())])
            .header("Accept", "application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|_| Error::InvalidPayload { body })
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let request = self.client.get(url).header("Accept", "application/json");
        Self::json_from_response(request.send().await).await
    }

    /// 2xx with parseable JSON wins; anything else is a candidate failure
    async fn json_from_response(
        response: reqwest::Result<reqwest::Response>,
    ) -> Result<serde_json::Value> {
        let response = response?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::other(format!("returned {}", status)));
        }
        Ok(response.json().await?)
    }

    async fn fetch_stream(&self, url: &str) -> Result<StreamPayload> {
        let response = self
            .client
            .get(url)
            .header("Accept", "audio/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .timeout(Duration::from_secs(STREAM_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::other(format!("returned {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let body = response.bytes().await?;
        Ok(StreamPayload { content_type, body })
    }
}

/// Builder for configuring a [`FailoverRouter`]
#[derive(Debug)]
pub struct FailoverRouterBuilder {
    client: Option<Client>,
    hosts: Option<Arc<HostSelector>>,
    flagship_hosts: Vec<String>,
    gateway_host: String,
    app_name: String,
    default_limit: usize,
}

impl Default for FailoverRouterBuilder {
    fn default() -> Self {
        Self {
            client: None,
            hosts: None,
            flagship_hosts: FLAGSHIP_HOSTS.iter().map(|s| s.to_string()).collect(),
            gateway_host: GATEWAY_HOST.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            default_limit: DEFAULT_TRENDING_LIMIT,
        }
    }
}

impl FailoverRouterBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the host selector (shared with the API layer for invalidation)
    pub fn hosts(mut self, hosts: Arc<HostSelector>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    /// Replace the flagship host list
    pub fn flagship_hosts(mut self, hosts: Vec<String>) -> Self {
        self.flagship_hosts = hosts;
        self
    }

    /// Set the search gateway host
    pub fn gateway_host(mut self, host: impl Into<String>) -> Self {
        self.gateway_host = host.into();
        self
    }

    /// Set the `app_name` query parameter sent upstream
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Set the trending page size used when the request carries no `limit`
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Build the router
    pub fn build(self) -> Result<FailoverRouter> {
        let hosts = match self.hosts {
            Some(hosts) => hosts,
            None => Arc::new(HostSelector::new()?),
        };

        let client = match self.client {
            Some(client) => client,
            None => Client::builder().user_agent(DEFAULT_USER_AGENT).build()?,
        };

        Ok(FailoverRouter {
            client,
            hosts,
            flagship_hosts: self.flagship_hosts,
            gateway_host: self.gateway_host,
            app_name: self.app_name,
            default_limit: self.default_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_classification() {
        assert_eq!(RequestKind::from_endpoint("/trending"), RequestKind::Trending);
        assert_eq!(
            RequestKind::from_endpoint("/tracks/trending"),
            RequestKind::Trending
        );
        assert_eq!(
            RequestKind::from_endpoint("/tracks/search"),
            RequestKind::Search
        );
        assert_eq!(
            RequestKind::from_endpoint("/tracks/abc123/stream"),
            RequestKind::Stream
        );
        assert_eq!(
            RequestKind::from_endpoint("/users/42/tracks"),
            RequestKind::Passthrough
        );
    }

    #[tokio::test]
    async fn candidates_are_deduplicated_and_ordered() {
        let hosts = Arc::new(
            HostSelector::builder()
                .registry_endpoints(vec![])
                .fallback_hosts(vec!["https://b.example".to_string()])
                .build()
                .unwrap(),
        );
        let router = FailoverRouter::builder()
            .hosts(hosts)
            .flagship_hosts(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
                String::new(),
            ])
            .build()
            .unwrap();

        let candidates = router.candidate_hosts().await.unwrap();
        // Selected host equals a flagship entry: deduplicated, order kept,
        // empty entry dropped.
        assert_eq!(
            candidates,
            vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
            ]
        );
    }
}
