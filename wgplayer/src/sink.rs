//! Audio output abstraction
//!
//! The controller never touches an audio device directly; it drives an
//! [`AudioSink`] and reacts to the [`SinkEvent`]s the sink emits. This is
//! the seam that keeps the recovery logic testable without real audio.

use crate::error::Result;
use async_trait::async_trait;

/// Events emitted by an audio sink during playback
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// Playback position advanced (seconds)
    TimeUpdate { position: f64 },
    /// Media metadata became available (duration in seconds)
    LoadedMetadata { duration: f64 },
    /// Playback actually started
    Started,
    /// Natural end of media, not an explicit pause
    Ended,
    /// The sink reported a playback error
    Error(String),
}

/// An audio output device
///
/// `stop` must fully release the current track: pause, reset the position
/// and clear the source, so a following `set_source` starts clean.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Point the sink at a new source URL
    async fn set_source(&self, url: &str) -> Result<()>;

    /// Start or resume playback of the current source
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the source and position
    async fn pause(&self) -> Result<()>;

    /// Stop playback: pause, reset position, clear the source
    async fn stop(&self) -> Result<()>;

    /// Set the output volume, `0.0..=1.0`
    async fn set_volume(&self, volume: f64) -> Result<()>;

    /// The currently assigned source URL, if any
    async fn source(&self) -> Option<String>;
}
