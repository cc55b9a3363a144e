//! Failures of the webhook surface.
//!
//! # Design
//! - [`ApiServerError`] covers the listener itself and aborts startup.
//! - [`WebhookRejection`] covers a single notification turned away before any promotion
//!   starts. Its `Display` text is the exact plain-text body sent back to the notifier.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::payload::PayloadError;

/// Result alias for API server operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while binding or serving the webhook listener.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// The listen address could not be bound.
    #[error("failed to bind webhook listener")]
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Socket error.
        source: std::io::Error,
    },
    /// The accept loop stopped with an error.
    #[error("webhook server terminated unexpectedly")]
    Serve {
        /// Socket error.
        source: std::io::Error,
    },
}

/// Why a notification was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookRejection {
    /// The request did not declare a JSON body.
    #[error("Error: Content-Type must be application/json")]
    NotJson,
    /// The body is not JSON or lacks `extra.searchee`.
    #[error("Error: Invalid JSON structure")]
    InvalidStructure {
        /// Parser diagnostics, kept for logs only.
        detail: String,
    },
    /// The body parsed but its fields are unusable.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// A promotion for the same original is still running.
    #[error("Error: a promotion for this torrent is already running")]
    Busy {
        /// Info hash already in flight.
        hash: String,
    },
}

impl WebhookRejection {
    /// HTTP status returned to the notifier.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotJson => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidStructure { .. } | Self::Payload(_) => StatusCode::BAD_REQUEST,
            Self::Busy { .. } => StatusCode::CONFLICT,
        }
    }

    /// Label recorded in the webhook verdict counter.
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::Busy { .. } => "busy",
            _ => "rejected",
        }
    }
}

impl From<JsonRejection> for WebhookRejection {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::NotJson,
            other => Self::InvalidStructure {
                detail: other.body_text(),
            },
        }
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn listener_failures_keep_their_socket_error() {
        let bind = ApiServerError::Bind {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9092),
            source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        };
        assert_eq!(bind.to_string(), "failed to bind webhook listener");
        assert!(bind.source().is_some());
    }

    #[test]
    fn rejections_map_to_status_and_counter_label() {
        let busy = WebhookRejection::Busy {
            hash: "aaa".to_string(),
        };
        assert_eq!(busy.status(), StatusCode::CONFLICT);
        assert_eq!(busy.verdict(), "busy");

        let unpaired = WebhookRejection::from(PayloadError::UnpairedTrackers);
        assert_eq!(unpaired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(unpaired.verdict(), "rejected");
        assert_eq!(
            unpaired.to_string(),
            "Error: 'infoHashes' and 'trackers' must have the same length"
        );

        assert_eq!(
            WebhookRejection::NotJson.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        let structure = WebhookRejection::InvalidStructure {
            detail: "expected value at line 1".to_string(),
        };
        assert_eq!(structure.to_string(), "Error: Invalid JSON structure");
    }
}
