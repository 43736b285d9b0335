//! # wgproxy - Failover Streaming Proxy for the Audius Network
//!
//! `wgproxy` fulfils trending, search and stream requests against the Audius
//! decentralized discovery network, where any single node can be down, slow
//! or rate-limiting at any time.
//!
//! ## Features
//!
//! - **Host Discovery**: Registry-backed node selection with a static,
//!   can't-fail fallback list ([`HostSelector`])
//! - **Failover Routing**: Every read path is an ordered candidate-host loop;
//!   first success wins ([`FailoverRouter`])
//! - **Binary Relay**: Stream endpoints forward the exact upstream bytes and
//!   content type, no re-encoding
//! - **HTTP Surface**: An axum router with permissive CORS and a documented
//!   error taxonomy ([`proxy_api_router`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wgproxy::{FailoverRouter, HostSelector, TrackPage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hosts = Arc::new(HostSelector::new()?);
//!     let router = FailoverRouter::builder().hosts(hosts).build()?;
//!
//!     let page = TrackPage::from_value(router.trending(Some(20)).await?)?;
//!     for track in page.streamable() {
//!         println!("{} - {}", track.user.name, track.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod error;
pub mod hosts;
pub mod models;
pub mod openapi;
pub mod router;

pub use api::{proxy_api_router, ErrorResponse, ProxyState};
pub use error::{Error, Result};
pub use hosts::{HostSelector, HostSelectorBuilder, FALLBACK_HOSTS, REGISTRY_ENDPOINTS};
pub use models::{Artist, Artwork, Track, TrackPage};
pub use openapi::ApiDoc;
pub use router::{
    FailoverRouter, FailoverRouterBuilder, RequestKind, StreamPayload, FLAGSHIP_HOSTS,
};
