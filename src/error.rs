/// Error types for Linkspace
use thiserror::Error;

/// Everything that can go wrong between the extension and its hosts.
///
/// Malformed remote content and stale window references are not errors:
/// they are absorbed where they happen and never reach this type.
#[derive(Debug, Error)]
pub enum LinkspaceError {
    /// A provider is missing required settings (e.g. no OAuth client ID).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The interactive sign-in was dismissed or returned no authorization code.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// A token or file endpoint answered with a non-success status.
    #[error("{context} failed: HTTP {status}")]
    Http { context: &'static str, status: u16 },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A browser API (storage, windows, identity, bookmarks) rejected the call.
    #[error("Host error: {0}")]
    Host(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Entropy source unavailable: {0}")]
    Entropy(String),
}

pub type Result<T> = std::result::Result<T, LinkspaceError>;

impl LinkspaceError {
    pub fn http(context: &'static str, status: u16) -> Self {
        LinkspaceError::Http { context, status }
    }
}
