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

//! Remote state synchronisation against the qBittorrent Web API.
//!
//! A [`RemoteClient`] yields one authenticated [`RemoteSession`] per promotion run; the
//! session performs property reads and location/category mutations and is released with
//! [`RemoteSession::logout`].

pub mod client;
pub mod error;
pub mod model;
pub mod session;

pub use client::QbitClient;
pub use error::{RemoteError, RemoteResult};
pub use model::TorrentProperties;
pub use session::{RemoteClient, RemoteSession};
