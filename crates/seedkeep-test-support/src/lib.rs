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

//! Shared test helpers used across unit and integration suites.
//! Layout: fixtures.rs (scratch directories), mocks.rs (recording download client).

pub mod fixtures;
pub mod mocks;

pub use fixtures::{scratch_dir, server_root};
pub use mocks::{RecordingRemote, RemoteCall};
