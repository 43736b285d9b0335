//! Error types for the catalog and presence services

use thiserror::Error;

/// Errors produced by catalog lookups and presence tracking
#[derive(Error, Debug)]
pub enum Error {
    /// The backend returned zero records for the requested category
    #[error("No track found for {0}.")]
    NoTracks(String),

    /// A record matched but carried no usable audio URL
    #[error("No audio URL for {0}.")]
    NoAudioUrl(String),

    /// The catalog backend itself failed
    #[error("Catalog backend error: {0}")]
    Backend(String),

    /// A record could not be interpreted as a catalog entry
    #[error("Invalid catalog document: {0}")]
    InvalidDocument(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;
