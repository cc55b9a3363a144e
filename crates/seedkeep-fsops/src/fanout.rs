//! Hardlink fan-out of canonical content into a tracker namespace.
//!
//! # Design
//! - Executes a precomputed [`LinkPlan`]; traversal happened during planning.
//! - Re-running against an already mirrored namespace is a no-op. A file already at a
//!   target counts only when it is the canonical inode; anything else is a conflict.
//! - Same-device placement is checked before anything is created.

use std::io;
use std::path::{Component, Path};

use tracing::debug;

use crate::error::{FsOpsError, FsOpsResult};
use crate::fs::{EntryKind, Filesystem};
use crate::model::LinkPlan;

/// Counts of what a fan-out pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Hardlinks created in this pass.
    pub linked: usize,
    /// Targets that already were hardlinks of the canonical file.
    pub already_present: usize,
    /// Directories created in this pass.
    pub directories_created: usize,
}

/// Mirror the canonical content at `canonical_root` into `plan.destination_root`.
///
/// # Errors
///
/// Returns [`FsOpsError::CrossDevice`] when the destination is on another filesystem,
/// [`FsOpsError::LinkExists`] when a target is occupied by an entry of the wrong kind or by
/// a file that is not a hardlink of the canonical content,
/// [`FsOpsError::InvalidInput`] for entries that would escape the destination, and
/// [`FsOpsError::Io`] for any other failure.
pub fn fan_out(
    fs: &dyn Filesystem,
    canonical_root: &Path,
    plan: &LinkPlan,
) -> FsOpsResult<FanOutReport> {
    let same_device = fs
        .same_device(canonical_root, &plan.destination_root)
        .map_err(|source| FsOpsError::io("fan_out.device", &plan.destination_root, source))?;
    if !same_device {
        return Err(cross_device(canonical_root, &plan.destination_root));
    }

    let mut report = FanOutReport::default();
    if !plan.is_directory {
        ensure_parent(fs, &plan.destination_root, &mut report)?;
        link_file(fs, canonical_root, &plan.destination_root, &mut report)?;
        return Ok(report);
    }

    ensure_dir(fs, &plan.destination_root, &mut report)?;
    for entry in &plan.entries {
        if !entry
            .relative_path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(FsOpsError::InvalidInput {
                field: "relative_path",
                reason: "escapes_root",
                value: Some(entry.relative_path.to_string_lossy().into_owned()),
            });
        }
        let target = plan.destination_root.join(&entry.relative_path);
        if entry.is_directory {
            ensure_dir(fs, &target, &mut report)?;
        } else {
            ensure_parent(fs, &target, &mut report)?;
            let original = canonical_root.join(&entry.relative_path);
            link_file(fs, &original, &target, &mut report)?;
        }
    }
    Ok(report)
}

fn ensure_dir(fs: &dyn Filesystem, path: &Path, report: &mut FanOutReport) -> FsOpsResult<()> {
    match kind_of(fs, path)? {
        Some(EntryKind::Directory) => Ok(()),
        Some(EntryKind::File) => Err(FsOpsError::LinkExists {
            path: path.to_path_buf(),
            expected: EntryKind::Directory,
        }),
        None => {
            fs.create_dir_all(path)
                .map_err(|source| FsOpsError::io("fan_out.create_dir", path, source))?;
            report.directories_created += 1;
            Ok(())
        }
    }
}

fn ensure_parent(fs: &dyn Filesystem, path: &Path, report: &mut FanOutReport) -> FsOpsResult<()> {
    path.parent()
        .map_or(Ok(()), |parent| ensure_dir(fs, parent, report))
}

fn link_file(
    fs: &dyn Filesystem,
    original: &Path,
    target: &Path,
    report: &mut FanOutReport,
) -> FsOpsResult<()> {
    match kind_of(fs, target)? {
        Some(EntryKind::File) => return accept_existing(fs, original, target, report),
        Some(EntryKind::Directory) => {
            return Err(FsOpsError::LinkExists {
                path: target.to_path_buf(),
                expected: EntryKind::File,
            });
        }
        None => {}
    }

    match fs.hard_link(original, target) {
        Ok(()) => {
            report.linked += 1;
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            accept_existing(fs, original, target, report)
        }
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            Err(cross_device(original, target))
        }
        Err(err) => Err(FsOpsError::io("fan_out.hard_link", target, err)),
    }
}

fn accept_existing(
    fs: &dyn Filesystem,
    original: &Path,
    target: &Path,
    report: &mut FanOutReport,
) -> FsOpsResult<()> {
    let linked = fs
        .same_file(original, target)
        .map_err(|source| FsOpsError::io("fan_out.same_file", target, source))?;
    if !linked {
        return Err(FsOpsError::LinkExists {
            path: target.to_path_buf(),
            expected: EntryKind::File,
        });
    }
    debug!(target = %target.display(), "fan-out target already linked");
    report.already_present += 1;
    Ok(())
}

fn kind_of(fs: &dyn Filesystem, path: &Path) -> FsOpsResult<Option<EntryKind>> {
    fs.entry_kind(path)
        .map_err(|source| FsOpsError::io("fan_out.stat", path, source))
}

fn cross_device(origin: &Path, destination: &Path) -> FsOpsError {
    FsOpsError::CrossDevice {
        origin: origin.to_path_buf(),
        destination: destination.to_path_buf(),
    }
}
