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
#![allow(clippy::module_name_repetitions)]

//! Seedkeep application wiring.
//!
//! Layout: `bootstrap.rs` (startup and serve loop), `orchestrator.rs` (promotion state
//! machine), `error.rs` (application errors and failure taxonomy).

/// Application bootstrap.
pub mod bootstrap;
/// Application errors.
pub mod error;
/// Promotion orchestration.
pub mod orchestrator;

pub use bootstrap::{run_app, run_with};
pub use error::{AppError, AppResult, FailureKind};
pub use orchestrator::{FailureDetail, OrchestrationResult, Orchestrator, Stage};
