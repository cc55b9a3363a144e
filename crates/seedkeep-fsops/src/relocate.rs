//! Atomic relocation of the original payload into the canonical root.
//!
//! # Design
//! - Same-volume moves never replace an existing entry: a directory is renamed onto an empty
//!   directory created exclusively for it, a file is hardlinked into place and then unlinked.
//! - Cross-volume moves copy into a hidden staging entry beside the destination, flush it,
//!   move it into place the same way, and only then remove the source. A crash at any point
//!   leaves at least one complete copy. Symlinks are copied as symlinks.
//! - Staging entries left behind by an interrupted copy are swept before a new one starts.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::RelocationPlan;

const STAGING_MARKER: &str = ".seedkeep-partial-";

/// How a relocation was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Moved with a single rename.
    Renamed,
    /// Copied across filesystems, flushed, then the source was removed.
    Copied,
    /// Source already is the destination; nothing to do.
    AlreadyInPlace,
}

impl RelocationOutcome {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::AlreadyInPlace => "already_in_place",
        }
    }
}

/// Execute a relocation plan.
///
/// # Errors
///
/// Returns [`FsOpsError::SourceMissing`] when the source no longer exists,
/// [`FsOpsError::AlreadyExists`] when the destination is occupied, and
/// [`FsOpsError::Io`]/[`FsOpsError::Walkdir`] for any other filesystem failure.
pub fn relocate(plan: &RelocationPlan) -> FsOpsResult<RelocationOutcome> {
    if plan.source == plan.destination {
        return Ok(RelocationOutcome::AlreadyInPlace);
    }

    if !exists(&plan.source, "relocate.stat_source")? {
        return Err(FsOpsError::SourceMissing {
            path: plan.source.clone(),
        });
    }
    if exists(&plan.destination, "relocate.stat_destination")? {
        return Err(FsOpsError::AlreadyExists {
            path: plan.destination.clone(),
        });
    }

    if let Some(parent) = plan.destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| FsOpsError::io("relocate.create_parent", parent, source))?;
    }

    match move_no_replace(&plan.source, &plan.destination) {
        Ok(()) => Ok(RelocationOutcome::Renamed),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                source = %plan.source.display(),
                destination = %plan.destination.display(),
                "rename crosses filesystems; falling back to copy"
            );
            copy_then_remove(&plan.source, &plan.destination)?;
            Ok(RelocationOutcome::Copied)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(FsOpsError::SourceMissing {
            path: plan.source.clone(),
        }),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(FsOpsError::AlreadyExists {
            path: plan.destination.clone(),
        }),
        Err(err) => Err(FsOpsError::io("relocate.rename", &plan.destination, err)),
    }
}

/// Move `from` to `to` on one volume, failing with `AlreadyExists` instead of replacing
/// anything that occupies `to`.
pub(crate) fn move_no_replace(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(from)?.is_dir() {
        fs::create_dir(to)?;
        fs::rename(from, to).inspect_err(|_| {
            let _ = fs::remove_dir(to);
        })
    } else {
        fs::hard_link(from, to)?;
        fs::remove_file(from)
    }
}

/// Copy `source` to `destination` through a flushed staging entry, then remove `source`.
pub(crate) fn copy_then_remove(source: &Path, destination: &Path) -> FsOpsResult<()> {
    sweep_stale_staging(destination)?;
    let staging = staging_path(destination)?;

    if let Err(err) = copy_tree_synced(source, &staging) {
        discard(&staging);
        return Err(err);
    }

    match move_no_replace(&staging, destination) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            discard(&staging);
            return Err(FsOpsError::AlreadyExists {
                path: destination.to_path_buf(),
            });
        }
        Err(err) => {
            discard(&staging);
            return Err(FsOpsError::io("relocate.promote_staging", destination, err));
        }
    }
    if let Some(parent) = destination.parent() {
        sync_dir(parent)?;
    }

    let source_is_dir = fs::symlink_metadata(source).is_ok_and(|meta| meta.is_dir());
    let removal = if source_is_dir {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    };
    match removal {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(FsOpsError::io("relocate.remove_source", source, err)),
    }
}

fn staging_prefix(destination: &Path) -> FsOpsResult<(&Path, OsString)> {
    let parent = destination
        .parent()
        .ok_or_else(|| FsOpsError::InvalidInput {
            field: "destination",
            reason: "no_parent",
            value: Some(destination.to_string_lossy().into_owned()),
        })?;
    let mut prefix = OsString::from(".");
    prefix.push(destination.file_name().unwrap_or_default());
    prefix.push(STAGING_MARKER);
    Ok((parent, prefix))
}

fn staging_path(destination: &Path) -> FsOpsResult<PathBuf> {
    let (parent, mut name) = staging_prefix(destination)?;
    name.push(Uuid::new_v4().simple().to_string());
    Ok(parent.join(name))
}

/// Remove staging entries an interrupted copy into `destination` left behind.
fn sweep_stale_staging(destination: &Path) -> FsOpsResult<()> {
    let (parent, prefix) = staging_prefix(destination)?;
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(FsOpsError::io("relocate.sweep_staging", parent, err)),
    };
    let prefix = prefix.to_string_lossy().into_owned();
    for entry in entries {
        let entry = entry.map_err(|err| FsOpsError::io("relocate.sweep_staging", parent, err))?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            debug!(path = %entry.path().display(), "removing stale relocation staging entry");
            discard(&entry.path());
        }
    }
    Ok(())
}

fn copy_tree_synced(source: &Path, destination: &Path) -> FsOpsResult<()> {
    let source_type = fs::symlink_metadata(source)
        .map_err(|err| FsOpsError::io("relocate.copy_stat", source, err))?
        .file_type();
    if source_type.is_symlink() {
        return copy_symlink(source, destination);
    }
    if !source_type.is_dir() {
        return copy_file_synced(source, destination);
    }

    let mut directories = Vec::new();
    for entry in WalkDir::new(source) {
        let entry =
            entry.map_err(|err| FsOpsError::walkdir("relocate.copy_walk", source, err))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| FsOpsError::InvalidInput {
                field: "source_path",
                reason: "strip_prefix",
                value: Some(entry.path().to_string_lossy().into_owned()),
            })?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|err| FsOpsError::io("relocate.copy_dir", &target, err))?;
            directories.push(target);
        } else if entry.file_type().is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file_synced(entry.path(), &target)?;
        }
    }

    for directory in directories.iter().rev() {
        sync_dir(directory)?;
    }
    Ok(())
}

fn copy_file_synced(source: &Path, destination: &Path) -> FsOpsResult<()> {
    fs::copy(source, destination)
        .map_err(|err| FsOpsError::io("relocate.copy_file", destination, err))?;
    File::open(destination)
        .and_then(|file| file.sync_all())
        .map_err(|err| FsOpsError::io("relocate.sync_file", destination, err))
}

#[cfg(unix)]
fn copy_symlink(source: &Path, destination: &Path) -> FsOpsResult<()> {
    let pointee = fs::read_link(source)
        .map_err(|err| FsOpsError::io("relocate.read_link", source, err))?;
    std::os::unix::fs::symlink(pointee, destination)
        .map_err(|err| FsOpsError::io("relocate.copy_symlink", destination, err))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, destination: &Path) -> FsOpsResult<()> {
    copy_file_synced(source, destination)
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> FsOpsResult<()> {
    File::open(path)
        .and_then(|dir| dir.sync_all())
        .map_err(|err| FsOpsError::io("relocate.sync_dir", path, err))
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> FsOpsResult<()> {
    Ok(())
}

fn exists(path: &Path, operation: &'static str) -> FsOpsResult<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(FsOpsError::io(operation, path, err)),
    }
}

fn discard(staging: &Path) {
    let is_dir = fs::symlink_metadata(staging).is_ok_and(|meta| meta.is_dir());
    let result = if is_dir {
        fs::remove_dir_all(staging)
    } else {
        fs::remove_file(staging)
    };
    if let Err(err) = result
        && err.kind() != io::ErrorKind::NotFound
    {
        warn!(
            path = %staging.display(),
            error = %err,
            "failed to discard relocation staging entry"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(source: PathBuf, destination: PathBuf) -> RelocationPlan {
        RelocationPlan {
            source,
            destination,
        }
    }

    #[test]
    fn rename_moves_directory_tree() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-dir")?;
        let source = temp.path().join("race/Release");
        fs::create_dir_all(source.join("Subs"))?;
        fs::write(source.join("video.mkv"), b"video")?;
        fs::write(source.join("Subs/en.srt"), b"subs")?;
        let destination = temp.path().join("longterm/Release");

        let outcome = relocate(&plan(source.clone(), destination.clone()))?;
        assert_eq!(outcome, RelocationOutcome::Renamed);
        assert!(!source.exists());
        assert_eq!(fs::read(destination.join("Subs/en.srt"))?, b"subs");
        Ok(())
    }

    #[test]
    fn exactly_one_copy_of_a_file_survives() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-file")?;
        let source = temp.path().join("race/movie.mkv");
        fs::create_dir_all(source.parent().ok_or_else(|| anyhow::anyhow!("parent"))?)?;
        fs::write(&source, b"frames")?;
        let destination = temp.path().join("longterm/movie.mkv");

        relocate(&plan(source.clone(), destination.clone()))?;
        assert!(source.exists() ^ destination.exists());
        assert!(destination.exists());
        Ok(())
    }

    #[test]
    fn occupied_destination_is_not_overwritten() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-exists")?;
        let source = temp.path().join("movie.mkv");
        fs::write(&source, b"new")?;
        let destination = temp.path().join("longterm/movie.mkv");
        fs::create_dir_all(temp.path().join("longterm"))?;
        fs::write(&destination, b"old")?;

        let result = relocate(&plan(source.clone(), destination.clone()));
        assert!(matches!(result, Err(FsOpsError::AlreadyExists { .. })));
        assert_eq!(fs::read(&destination)?, b"old");
        assert!(source.exists());
        Ok(())
    }

    #[test]
    fn vanished_source_is_reported() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-missing")?;
        let result = relocate(&plan(
            temp.path().join("gone"),
            temp.path().join("longterm/gone"),
        ));
        assert!(matches!(result, Err(FsOpsError::SourceMissing { .. })));
        Ok(())
    }

    #[test]
    fn identical_paths_are_already_in_place() -> anyhow::Result<()> {
        let path = PathBuf::from("/data/longterm/Release");
        assert_eq!(
            relocate(&plan(path.clone(), path))?,
            RelocationOutcome::AlreadyInPlace
        );
        Ok(())
    }

    #[test]
    fn copy_fallback_preserves_tree_and_removes_source() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-copy")?;
        let source = temp.path().join("race/Release");
        fs::create_dir_all(source.join("CD1"))?;
        fs::write(source.join("CD1/track01.flac"), b"audio")?;
        fs::write(source.join("cover.jpg"), b"image")?;
        let destination = temp.path().join("longterm/Release");
        fs::create_dir_all(temp.path().join("longterm"))?;

        copy_then_remove(&source, &destination)?;

        assert!(!source.exists());
        assert_eq!(fs::read(destination.join("CD1/track01.flac"))?, b"audio");
        assert_eq!(fs::read(destination.join("cover.jpg"))?, b"image");
        let leftovers: Vec<_> = fs::read_dir(temp.path().join("longterm"))?
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains("seedkeep-partial"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn occupied_file_destination_is_never_replaced_by_the_move() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-noreplace")?;
        let source = temp.path().join("movie.mkv");
        let destination = temp.path().join("movie.longterm.mkv");
        fs::write(&source, b"new")?;
        fs::write(&destination, b"old")?;

        let err = move_no_replace(&source, &destination)
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected the move to be refused"))?;
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&destination)?, b"old");
        assert_eq!(fs::read(&source)?, b"new");
        Ok(())
    }

    #[test]
    fn empty_directory_at_destination_is_not_replaced() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-noreplace-dir")?;
        let source = temp.path().join("race/Release");
        fs::create_dir_all(&source)?;
        fs::write(source.join("video.mkv"), b"video")?;
        let destination = temp.path().join("Release");
        fs::create_dir(&destination)?;

        let err = move_no_replace(&source, &destination)
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected the move to be refused"))?;
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(source.join("video.mkv").is_file());
        assert_eq!(fs::read_dir(&destination)?.count(), 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn copy_fallback_keeps_symlinks_as_symlinks() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-copy-symlink")?;
        let source = temp.path().join("race/Release");
        fs::create_dir_all(&source)?;
        fs::write(source.join("e01.mkv"), b"video")?;
        std::os::unix::fs::symlink("e01.mkv", source.join("latest.mkv"))?;
        let destination = temp.path().join("longterm/Release");
        fs::create_dir_all(temp.path().join("longterm"))?;

        copy_then_remove(&source, &destination)?;

        let copied = destination.join("latest.mkv");
        assert!(fs::symlink_metadata(&copied)?.file_type().is_symlink());
        assert_eq!(fs::read_link(&copied)?, PathBuf::from("e01.mkv"));
        assert_eq!(fs::read(&copied)?, b"video");
        Ok(())
    }

    #[test]
    fn stale_staging_from_an_interrupted_copy_is_swept() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-sweep")?;
        let source = temp.path().join("race/Release");
        fs::create_dir_all(&source)?;
        fs::write(source.join("video.mkv"), b"video")?;
        let longterm = temp.path().join("longterm");
        let stale = longterm.join(".Release.seedkeep-partial-0123abcd");
        fs::create_dir_all(&stale)?;
        fs::write(stale.join("video.mkv"), b"vid")?;
        let unrelated = longterm.join(".Other.seedkeep-partial-0123abcd");
        fs::create_dir_all(&unrelated)?;

        copy_then_remove(&source, &longterm.join("Release"))?;

        assert!(!stale.exists());
        assert!(unrelated.exists());
        assert_eq!(fs::read(longterm.join("Release/video.mkv"))?, b"video");
        Ok(())
    }

    #[test]
    fn copy_fallback_keeps_source_when_destination_appears() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("relocate-copy-race")?;
        let source = temp.path().join("movie.mkv");
        fs::write(&source, b"frames")?;
        let destination = temp.path().join("longterm/movie.mkv");
        fs::create_dir_all(temp.path().join("longterm"))?;
        fs::write(&destination, b"other")?;

        let result = copy_then_remove(&source, &destination);
        assert!(matches!(result, Err(FsOpsError::AlreadyExists { .. })));
        assert!(source.exists());
        assert_eq!(fs::read(&destination)?, b"other");
        Ok(())
    }
}
