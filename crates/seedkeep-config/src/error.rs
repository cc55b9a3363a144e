//! # Design
//!
//! - Keep messages constant; carry the offending field and value as structured context.
//! - Every variant is fatal at startup, never a per-request failure.

use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable was absent or blank.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing variable.
        name: &'static str,
    },
    /// A field held a value that failed validation.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.into()),
        }
    }
}
