//! # WaveGate Catalog
//!
//! Track catalog provider and listener presence service.
//!
//! ## Features
//!
//! - **Catalog entries**: category-tagged records holding pools of candidate
//!   audio URLs, with legacy field-name aliases resolved at the data-access
//!   boundary
//! - **Random URL picking**: one random entry, then one random URL from its
//!   pool
//! - **Presence tracking**: join/leave by opaque session id with a push-based
//!   live listener count
//!
//! ## Quick Start
//!
//! ```no_run
//! use wgcatalog::{pick_audio_url, StaticCatalog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = StaticCatalog::from_yaml(
//!         "- category: chill\n  song_urls: [\"https://cdn/1.mp3\"]\n",
//!     )?;
//!     let url = pick_audio_url(&catalog, Some("chill")).await?;
//!     println!("Playing {url}");
//!     Ok(())
//! }
//! ```

#[cfg(feature = "api")]
pub mod api;
pub mod error;
pub mod models;
pub mod presence;
pub mod provider;

#[cfg(feature = "api")]
pub use api::{presence_api_router, CountResponse, PresenceState};
pub use error::{Error, Result};
pub use models::{CatalogEntry, POOL_ALIASES, SINGLE_ALIASES};
pub use presence::{InMemoryPresence, PresenceService};
pub use provider::{pick_audio_url, CatalogProvider, StaticCatalog};
