//! Removal of duplicate content superseded by hardlinks.
//!
//! Callers invoke this only after the fan-out for the same duplicate succeeded.
//! Paths that are, contain, or sit inside protected paths are never removed, and relative
//! targets are refused outright.

use std::io;
use std::path::Path;

use tracing::warn;

use crate::error::{FsOpsError, FsOpsResult};
use crate::fs::{EntryKind, Filesystem};

/// What the reaper did with a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    /// The content was removed.
    Removed,
    /// Nothing existed at the target.
    Absent,
    /// The target overlaps a protected path and was left alone.
    Protected,
}

impl ReapOutcome {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Removed => "removed",
            Self::Absent => "absent",
            Self::Protected => "protected",
        }
    }
}

/// Remove `target` recursively when it is a directory, as a single file otherwise.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] for a relative target, and [`FsOpsError::Io`] when
/// the stat or the removal fails for any reason other than the target already being gone.
pub fn reap(fs: &dyn Filesystem, target: &Path, protected: &[&Path]) -> FsOpsResult<ReapOutcome> {
    if !target.is_absolute() {
        return Err(FsOpsError::InvalidInput {
            field: "reap_target",
            reason: "not_absolute",
            value: Some(target.to_string_lossy().into_owned()),
        });
    }
    if let Some(guarded) = protected
        .iter()
        .find(|guarded| guarded.starts_with(target) || target.starts_with(guarded))
    {
        warn!(
            target = %target.display(),
            protected = %guarded.display(),
            "refusing to reap content overlapping linked data"
        );
        return Ok(ReapOutcome::Protected);
    }

    let kind = fs
        .entry_kind(target)
        .map_err(|source| FsOpsError::io("reap.stat", target, source))?;
    let removal = match kind {
        None => return Ok(ReapOutcome::Absent),
        Some(EntryKind::Directory) => fs.remove_dir_all(target),
        Some(EntryKind::File) => fs.remove_file(target),
    };
    match removal {
        Ok(()) => Ok(ReapOutcome::Removed),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ReapOutcome::Absent),
        Err(err) => Err(FsOpsError::io("reap.remove", target, err)),
    }
}
