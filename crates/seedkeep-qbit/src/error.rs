//! Error types for the remote client.
//!
//! # Design
//! - Transport detail (status codes, login body checks) is folded into four failure kinds.
//! - Messages are constant; context lives in fields.

use thiserror::Error;

/// Result type for remote client operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failures talking to the download client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Login was refused.
    #[error("remote client rejected credentials")]
    AuthFailure {
        /// HTTP status returned by the login call.
        status: u16,
    },
    /// Transport failure or server-side error.
    #[error("remote client unreachable")]
    Unreachable {
        /// API operation being attempted.
        operation: &'static str,
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// Transport error, when the request itself failed.
        #[source]
        source: Option<reqwest::Error>,
    },
    /// The client has no torrent with this hash.
    #[error("torrent unknown to remote client")]
    NotFound {
        /// Requested info hash.
        hash: String,
    },
    /// A mutation was refused by the client.
    #[error("remote client rejected request")]
    RemoteRejected {
        /// API operation being attempted.
        operation: &'static str,
        /// HTTP status returned.
        status: u16,
    },
    /// The configured endpoint is not a valid URL.
    #[error("remote client url invalid")]
    InvalidUrl {
        /// Offending URL text.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },
}

impl RemoteError {
    pub(crate) const fn transport(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Unreachable {
            operation,
            status: None,
            source: Some(source),
        }
    }

    pub(crate) const fn status(operation: &'static str, status: u16) -> Self {
        Self::Unreachable {
            operation,
            status: Some(status),
            source: None,
        }
    }
}
