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

//! Storage side of torrent promotion: locate content, move it into the canonical
//! root exactly once, mirror it into tracker namespaces with hardlinks, and reap the
//! copies those links supersede.
//!
//! Layout: `model.rs` (plans and descriptors), `fs.rs` (filesystem abstraction),
//! `locate.rs`, `plan.rs`, `relocate.rs`, `fanout.rs`, `reap.rs` (one component each),
//! `service.rs` (step logging and metrics around the components).

pub mod error;
pub mod fanout;
pub mod fs;
pub mod locate;
pub mod model;
pub mod plan;
pub mod reap;
pub mod relocate;
pub mod service;
#[cfg(test)]
mod testing;

pub use error::{FsOpsError, FsOpsResult};
pub use fanout::{FanOutReport, fan_out};
pub use fs::{EntryKind, Filesystem, LocalFilesystem};
pub use locate::{content_path, locate_content};
pub use model::{ContentDescriptor, LinkEntry, LinkPlan, RelocationPlan};
pub use plan::{UNKNOWN_TRACKER, plan_links, plan_relocation, tracker_namespace};
pub use reap::{ReapOutcome, reap};
pub use relocate::{RelocationOutcome, relocate};
pub use service::FsOpsService;
