//! Error vocabulary for locating, moving, linking and reaping content.
//!
//! # Design
//! - Messages are fixed strings; paths and operations travel as fields.
//! - Conflicts the promotion flow must classify (occupied destination, vanished source,
//!   cross-device link) get their own variants instead of hiding inside `Io`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fs::EntryKind;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced while relocating, linking, or reaping torrent content.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// A filesystem call failed outright.
    #[error("filesystem operation failed")]
    Io {
        /// Name of the failing call (`rename`, `hard_link`, ...).
        operation: &'static str,
        /// Path the call was acting on.
        path: PathBuf,
        /// Error reported by the operating system.
        source: io::Error,
    },
    /// Enumerating a content tree failed part way through.
    #[error("content tree walk failed")]
    Walkdir {
        /// Step that requested the walk.
        operation: &'static str,
        /// Root of the walk.
        path: PathBuf,
        /// Traversal error.
        source: walkdir::Error,
    },
    /// Content reported by the download client is not on disk.
    #[error("torrent content missing on disk")]
    ContentMissing {
        /// Path that was expected to exist.
        path: PathBuf,
    },
    /// Relocation source vanished after it was located.
    #[error("relocation source missing")]
    SourceMissing {
        /// Source path of the relocation.
        path: PathBuf,
    },
    /// Relocation destination is already occupied.
    #[error("relocation destination already exists")]
    AlreadyExists {
        /// Occupied destination path.
        path: PathBuf,
    },
    /// Hardlink source and destination live on different filesystems.
    #[error("hardlink crosses filesystem boundary")]
    CrossDevice {
        /// Canonical content being linked.
        origin: PathBuf,
        /// Fan-out destination that cannot hold the link.
        destination: PathBuf,
    },
    /// A fan-out target is occupied by an entry of the wrong kind.
    #[error("fan-out target occupied by conflicting entry")]
    LinkExists {
        /// Conflicting target path.
        path: PathBuf,
        /// Kind of entry the fan-out needed to place there.
        expected: EntryKind,
    },
    /// A name or path handed to the planner cannot be used.
    #[error("invalid path input")]
    InvalidInput {
        /// Argument that was rejected.
        field: &'static str,
        /// Why the argument was rejected.
        reason: &'static str,
        /// Rejected value, when printable.
        value: Option<String>,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }
}
