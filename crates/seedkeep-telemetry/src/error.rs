//! Telemetry failures: subscriber installation and the Prometheus registry.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed, or installation failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A collector could not be created or registered.
    #[error("failed to register metric")]
    MetricsRegister {
        /// Collector name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The registry could not be rendered as text.
    #[error("failed to render metrics")]
    MetricsRender {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
}
