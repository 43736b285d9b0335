//! Error types for playback control

use thiserror::Error;

/// Errors produced by the playback controller and stream client
#[derive(Error, Debug)]
pub enum Error {
    /// The track carries no identifier and cannot be streamed
    #[error("This track cannot be streamed - no ID available.")]
    MissingTrackId,

    /// The audio sink rejected an operation
    #[error("Audio sink error: {0}")]
    Sink(String),

    /// HTTP request to the proxy failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected payload from the proxy
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The retry budget for the current track is exhausted
    #[error("Failed to stream track after {attempts} attempts.")]
    RetriesExhausted { attempts: u32 },

    /// Catalog lookup failed (retro mode)
    #[error(transparent)]
    Catalog(#[from] wgcatalog::Error),
}

/// Result type alias for playback operations
pub type Result<T> = std::result::Result<T, Error>;
