//! Errors raised while booting the service or driving a promotion.
//!
//! # Design
//! - Each variant wraps one crate's error together with the operation that produced it.
//! - [`AppError::kind`] folds every wrapped error onto the [`FailureKind`] taxonomy that
//!   promotion results report.

use seedkeep_api::ApiServerError;
use seedkeep_config::ConfigError;
use seedkeep_fsops::FsOpsError;
use seedkeep_qbit::RemoteError;
use seedkeep_telemetry::TelemetryError;
use thiserror::Error;
use tokio::task::JoinError;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Failures surfaced by bootstrap and the orchestrator.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings could not be read from the environment.
    #[error("configuration operation failed")]
    Config {
        /// Step that loaded the settings.
        operation: &'static str,
        /// Loader failure.
        source: ConfigError,
    },
    /// The webhook listener could not bind or stopped abnormally.
    #[error("api server operation failed")]
    ApiServer {
        /// Listener step that failed.
        operation: &'static str,
        /// Server failure.
        source: ApiServerError,
    },
    /// Logging could not be installed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Telemetry step that failed.
        operation: &'static str,
        /// Subscriber or registry failure.
        source: TelemetryError,
    },
    /// Building the download client failed before any request was sent.
    #[error("remote client setup failed")]
    RemoteSetup {
        /// Setup step that failed.
        operation: &'static str,
        /// Client construction failure.
        source: RemoteError,
    },
    /// A call against the download client failed for the given torrent.
    #[error("remote client operation failed")]
    Remote {
        /// Remote call that failed.
        operation: &'static str,
        /// Info hash the call concerned.
        hash: String,
        /// Classified remote failure.
        source: RemoteError,
    },
    /// Locating, moving, linking or reaping content failed.
    #[error("storage operation failed")]
    FsOps {
        /// Storage step that failed.
        operation: &'static str,
        /// Storage failure.
        source: FsOpsError,
    },
    /// A blocking storage task panicked or was cancelled.
    #[error("storage task did not complete")]
    Join {
        /// Storage step whose task died.
        operation: &'static str,
        /// Runtime join failure.
        source: JoinError,
    },
}

/// Failure taxonomy reported for a promotion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The notification was malformed; the core never ran.
    Validation,
    /// Credentials were refused.
    AuthFailure,
    /// The client could not be reached or answered with a server error.
    Unreachable,
    /// The client refused a mutation.
    RemoteRejected,
    /// The client has no record of a torrent.
    NotFound,
    /// Local IO failed or content was missing on disk.
    FilesystemError,
    /// The relocation destination is occupied.
    AlreadyExists,
    /// The relocation source vanished.
    SourceMissing,
    /// Fan-out destination is on another filesystem.
    CrossDevice,
    /// A fan-out target is occupied by a conflicting entry.
    LinkExists,
    /// A worker task died.
    Internal,
}

impl FailureKind {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::AuthFailure => "auth_failure",
            Self::Unreachable => "unreachable",
            Self::RemoteRejected => "remote_rejected",
            Self::NotFound => "not_found",
            Self::FilesystemError => "filesystem_error",
            Self::AlreadyExists => "already_exists",
            Self::SourceMissing => "source_missing",
            Self::CrossDevice => "cross_device",
            Self::LinkExists => "link_exists",
            Self::Internal => "internal",
        }
    }
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn api_server(operation: &'static str, source: ApiServerError) -> Self {
        Self::ApiServer { operation, source }
    }

    pub(crate) const fn telemetry(operation: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) fn remote(operation: &'static str, hash: &str, source: RemoteError) -> Self {
        Self::Remote {
            operation,
            hash: hash.to_string(),
            source,
        }
    }

    pub(crate) const fn fsops(operation: &'static str, source: FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    /// Position of this error in the failure taxonomy.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Config { .. } => FailureKind::Validation,
            Self::ApiServer { .. } | Self::Telemetry { .. } | Self::Join { .. } => {
                FailureKind::Internal
            }
            Self::RemoteSetup { .. } => FailureKind::Unreachable,
            Self::Remote { source, .. } => match source {
                RemoteError::AuthFailure { .. } => FailureKind::AuthFailure,
                RemoteError::Unreachable { .. } | RemoteError::InvalidUrl { .. } => {
                    FailureKind::Unreachable
                }
                RemoteError::NotFound { .. } => FailureKind::NotFound,
                RemoteError::RemoteRejected { .. } => FailureKind::RemoteRejected,
            },
            Self::FsOps { source, .. } => match source {
                FsOpsError::Io { .. }
                | FsOpsError::Walkdir { .. }
                | FsOpsError::ContentMissing { .. }
                | FsOpsError::InvalidInput { .. } => FailureKind::FilesystemError,
                FsOpsError::SourceMissing { .. } => FailureKind::SourceMissing,
                FsOpsError::AlreadyExists { .. } => FailureKind::AlreadyExists,
                FsOpsError::CrossDevice { .. } => FailureKind::CrossDevice,
                FsOpsError::LinkExists { .. } => FailureKind::LinkExists,
            },
        }
    }
}
