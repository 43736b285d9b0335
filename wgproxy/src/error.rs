//! Error types for the failover proxy

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing requests to the discovery network
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Search was requested with an empty or whitespace-only query
    #[error("Search query required")]
    MissingQuery,

    /// Every trending candidate host failed
    #[error("Trending unavailable from all hosts")]
    TrendingUnavailable { last_error: String },

    /// Every search source failed
    #[error("Search failed on all hosts")]
    SearchUnavailable,

    /// Every stream candidate host failed
    #[error("Stream unavailable from all hosts")]
    StreamUnavailable { last_error: String },

    /// Upstream answered a passthrough request with a non-success status
    #[error("API returned {status}")]
    UpstreamStatus { status: u16, body: String },

    /// Upstream answered 2xx but the body was not valid JSON
    #[error("Invalid JSON response from API")]
    InvalidPayload { body: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
