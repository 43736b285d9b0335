//! Discovery-node host selection
//!
//! The Audius read API is served by independently operated discovery nodes.
//! [`HostSelector`] asks a small set of registry endpoints for the live node
//! list, picks one node uniformly at random and caches it for the rest of the
//! process. When no registry endpoint is reachable it falls back to a static
//! list of known-stable nodes, so selection itself never fails.
//!
//! The cached host is owned by this struct (shared via `Arc`) rather than
//! process-wide state; [`HostSelector::invalidate`] clears it so the next
//! request re-runs discovery.

use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::thread_rng;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Registry endpoints that publish the live discovery-node list
pub const REGISTRY_ENDPOINTS: &[&str] = &[
    "https://api.audius.co",
    "https://cors-anywhere.herokuapp.com/https://api.audius.co",
    "https://api.codetabs.com/v1/proxy?quest=https://api.audius.co",
];

/// Known-stable discovery nodes used when every registry endpoint fails
pub const FALLBACK_HOSTS: &[&str] = &[
    "https://discoveryprovider.audius.co",
    "https://discoveryprovider1.audius.co",
    "https://audius-discovery-1.audius.co",
];

/// Default timeout for registry requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent sent upstream (some nodes reject non-browser agents)
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Registry response shape: `{ "data": ["https://node", ...] }`
#[derive(Debug, Deserialize)]
struct HostList {
    #[serde(default)]
    data: Vec<String>,
}

/// Selects and caches a usable discovery-node host
///
/// # Example
///
/// ```no_run
/// use wgproxy::HostSelector;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let selector = HostSelector::new()?;
///     let host = selector.select().await?;
///     println!("Selected host: {}", host);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct HostSelector {
    client: Client,
    registry_endpoints: Vec<String>,
    fallback_hosts: Vec<String>,
    selected: RwLock<Option<String>>,
}

impl HostSelector {
    /// Create a selector with the default registry endpoints and fallbacks
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the selector
    pub fn builder() -> HostSelectorBuilder {
        HostSelectorBuilder::default()
    }

    /// Return the cached host, running discovery if none is cached
    ///
    /// Discovery tries each registry endpoint in order and picks one node
    /// uniformly at random from the first non-empty list. If every endpoint
    /// fails, a node is picked from the static fallback list; with the
    /// default configuration this method therefore cannot fail.
    pub async fn select(&self) -> Result<String> {
        if let Some(host) = self.selected.read().await.clone() {
            return Ok(host);
        }

        let host = self.discover().await?;
        *self.selected.write().await = Some(host.clone());
        Ok(host)
    }

    /// Return the cached host without triggering discovery
    pub async fn selected(&self) -> Option<String> {
        self.selected.read().await.clone()
    }

    /// Clear the cached host so the next [`select`](Self::select) re-discovers
    pub async fn invalidate(&self) {
        let mut selected = self.selected.write().await;
        if selected.take().is_some() {
            info!("Selected host invalidated, next request re-runs discovery");
        }
    }

    async fn discover(&self) -> Result<String> {
        for endpoint in &self.registry_endpoints {
            match self.fetch_host_list(endpoint).await {
                Ok(hosts) if !hosts.is_empty() => {
                    let host = pick_random(&hosts)
                        .ok_or_else(|| Error::other("host list unexpectedly empty"))?;
                    info!(host = %host, registry = %endpoint, "Selected discovery host");
                    return Ok(host);
                }
                Ok(_) => {
                    debug!(registry = %endpoint, "Registry returned an empty host list");
                }
                Err(err) => {
                    debug!(registry = %endpoint, error = %err, "Registry endpoint failed");
                }
            }
        }

        // Static fallback: this path cannot fail with a non-empty list.
        let host = pick_random(&self.fallback_hosts)
            .ok_or_else(|| Error::other("no fallback hosts configured"))?;
        warn!(host = %host, "All registry endpoints failed, using fallback host");
        Ok(host)
    }

    async fn fetch_host_list(&self, endpoint: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(endpoint)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::other(format!(
                "registry returned status {}",
                response.status()
            )));
        }

        let list: HostList = response.json().await?;
        Ok(list.data)
    }
}

fn pick_random(hosts: &[String]) -> Option<String> {
    let mut rng = thread_rng();
    hosts.choose(&mut rng).cloned()
}

/// Builder for configuring a [`HostSelector`]
#[derive(Debug)]
pub struct HostSelectorBuilder {
    client: Option<Client>,
    registry_endpoints: Vec<String>,
    fallback_hosts: Vec<String>,
    timeout: Duration,
}

impl Default for HostSelectorBuilder {
    fn default() -> Self {
        Self {
            client: None,
            registry_endpoints: REGISTRY_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            fallback_hosts: FALLBACK_HOSTS.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HostSelectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Replace the registry endpoint list
    pub fn registry_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.registry_endpoints = endpoints;
        self
    }

    /// Replace the static fallback host list
    pub fn fallback_hosts(mut self, hosts: Vec<String>) -> Self {
        self.fallback_hosts = hosts;
        self
    }

    /// Set the registry request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the selector
    pub fn build(self) -> Result<HostSelector> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(DEFAULT_USER_AGENT)
                .timeout(self.timeout)
                .build()?,
        };

        Ok(HostSelector {
            client,
            registry_endpoints: self.registry_endpoints,
            fallback_hosts: self.fallback_hosts,
            selected: RwLock::new(None),
        })
    }
}
