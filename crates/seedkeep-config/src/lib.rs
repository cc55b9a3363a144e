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

//! Environment-backed configuration for the promoter service.
//!
//! Layout: `model.rs` (typed configuration), `defaults.rs` (fallback values),
//! `loader.rs` (environment lookup), `validate.rs` (cross-field checks).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_from, load_from_env};
pub use model::{ClientEndpoint, Credentials, ListenConfig, PromoterConfig, StorageRoots};
