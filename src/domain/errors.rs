//! Domain Errors
//!
//! Error taxonomy shared by the search ports and their adapters.

use thiserror::Error;

/// Errors raised by place search, city lookup and recent search storage.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// Transport-level failure (connection refused, DNS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The client-side timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The remote answered with a non-2xx status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Well-formed response with nothing in it.
    #[error("no results")]
    NoResults,

    /// Response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A suggestion needed a retrieve call that could not be routed.
    #[error("suggestion {0} cannot be resolved")]
    Unresolved(String),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl SearchError {
    /// Whether this error comes from the network and should degrade the
    /// search rather than fail it.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::Status { .. } | Self::Decode(_)
        )
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
