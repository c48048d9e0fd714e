use std::sync::Arc;
use std::time::Duration;

/// Result type used throughout the client.
///
/// Only the low-level transport surfaces errors directly; the high-level
/// [`ConfigClient`](crate::ConfigClient) operations convert terminal failures
/// into [`Resolution::Fallback`](crate::Resolution::Fallback) instead.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors raised by the client.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Invalid base_url configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The configured API key cannot be carried in an Authorization header.
    #[error("api_key contains characters not allowed in a header value")]
    InvalidApiKey,

    /// Server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),

    /// A single attempt exceeded its time budget.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Network error.
    #[error(transparent)]
    // reqwest::Error is not clonable, so we're wrapping it in an Arc.
    Network(Arc<reqwest::Error>),

    /// The request body cannot be replayed for a retry attempt.
    #[error("request body cannot be replayed")]
    UnreplayableRequest,

    /// A registry convenience function was called before
    /// [`registry::initialize`](crate::registry::initialize).
    #[error("registry::initialize() must be called before using the default instance")]
    Uninitialized,
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}
