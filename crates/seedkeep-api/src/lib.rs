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

//! Inbound HTTP surface: receives cross-seed notifications, decides whether they call for a
//! promotion, and hands admitted requests to a [`Promoter`].
//!
//! Layout: `payload.rs` (wire shape and admission rules), `error.rs` (listener failures and
//! notification rejections), `promoter.rs` (core seam),
//! `state.rs` (shared state and in-flight guard), `handlers.rs`, `server.rs`.

pub mod error;
mod handlers;
pub mod payload;
pub mod promoter;
pub mod server;
pub mod state;

pub use error::{ApiServerError, ApiServerResult, WebhookRejection};
pub use payload::{Admission, PayloadError, WebhookPayload};
pub use promoter::{DuplicateRef, PromotionRequest, PromotionVerdict, Promoter, TorrentRef};
pub use server::ApiServer;
pub use state::ApiState;
