#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives shared across the seedkeep workspace.
//!
//! Layout: `init.rs` (subscriber installation), `request.rs` (request-id middleware and
//! request spans), `metrics.rs` (Prometheus registry), `error.rs` (error types).

pub mod error;
pub mod init;
pub mod metrics;
pub mod request;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use metrics::Metrics;
pub use request::{
    REQUEST_ID_HEADER, propagate_request_id_layer, request_span, set_request_id_layer,
};
