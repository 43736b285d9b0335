//! # WaveGate Player
//!
//! Playback controller with retry/backoff recovery.
//!
//! ## Features
//!
//! - **Playback control**: play/pause/next/volume over a pluggable
//!   [`AudioSink`], serialized through a single active session
//! - **Recovery**: exponential-backoff retries on start failures and sink
//!   errors, capped at five attempts per track, cancellable on pause or
//!   track switch
//! - **Auto-advance**: wrap-around queue progression on natural end of
//!   media
//! - **Proxy client**: trending/search/stream endpoints behind the
//!   [`StreamApi`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wgplayer::{HttpStreamApi, PlayerController, RetryPolicy, StreamApi};
//! # use wgplayer::{AudioSink, Result};
//! # async fn sink() -> Arc<dyn AudioSink> { unimplemented!() }
//!
//! # async fn demo() -> Result<()> {
//! let api = Arc::new(HttpStreamApi::new()?);
//! let (mut player, mut retries) = PlayerController::new(sink().await, api.clone(), RetryPolicy::default());
//!
//! let trending = api.trending(Some(20)).await?;
//! if let Some(first) = trending.first().cloned() {
//!     player.play(first, Some(trending)).await?;
//! }
//! while let Some(fired) = retries.recv().await {
//!     player.handle_retry(fired).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod controller;
pub mod error;
pub mod queue;
pub mod retry;
pub mod session;
pub mod sink;

pub use client::{HttpStreamApi, HttpStreamApiBuilder, StreamApi};
pub use controller::{PlayerController, START_GRACE_MS, VOLUME_STEP};
pub use error::{Error, Result};
pub use queue::TrackQueue;
pub use retry::{RetryFired, RetryPolicy, RetryScheduler};
pub use session::{PlaybackSession, PlaybackState};
pub use sink::{AudioSink, SinkEvent};
