//! Error taxonomy for the spotlikes operations.
//!
//! Configuration and authorization failures are fatal to the operation that
//! hit them. Page-level failures of the bulk fetch never show up here: they are
//! absorbed inside [`crate::spotify::library`].

use thiserror::Error;

/// Result type used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing or malformed. Raised before any network,
    /// browser or socket activity.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The token endpoint rejected the request, or the callback listener could
    /// not bind its port.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The authorization redirect arrived without a `code` parameter.
    #[error("no authorization code found{}", provider_error(.0))]
    MissingCode(Option<String>),

    /// Exchanging the authorization code for a user token failed.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// A request outside the per-page policy failed (probe, search).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Writing the result failed.
    #[error("could not store result: {0}")]
    Sink(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Fetch(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Sink(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Sink(err.to_string())
    }
}

fn provider_error(error: &Option<String>) -> String {
    error
        .as_deref()
        .map(|e| format!(" (provider error: {e})"))
        .unwrap_or_default()
}
