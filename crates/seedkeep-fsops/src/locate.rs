//! Filesystem half of the content locator.
//!
//! The download client reports a save directory and a name; the shape of the payload is
//! decided by a stat here because the client does not report it reliably.

use std::path::{Component, Path, PathBuf};

use crate::error::{FsOpsError, FsOpsResult};
use crate::fs::{EntryKind, Filesystem};
use crate::model::ContentDescriptor;

/// Resolve `save_path/name` on disk and classify it as a file or a directory tree.
///
/// # Errors
///
/// Returns [`FsOpsError::ContentMissing`] when nothing exists at the joined path,
/// [`FsOpsError::InvalidInput`] when the name is not a single path component or the save
/// path is relative, and [`FsOpsError::Io`] when the stat itself fails.
pub fn locate_content(
    fs: &dyn Filesystem,
    save_path: &Path,
    name: &str,
) -> FsOpsResult<ContentDescriptor> {
    let root_path = content_path(save_path, name)?;
    let kind = fs
        .entry_kind(&root_path)
        .map_err(|source| FsOpsError::io("locate.stat", &root_path, source))?
        .ok_or_else(|| FsOpsError::ContentMissing {
            path: root_path.clone(),
        })?;

    Ok(ContentDescriptor {
        name: name.to_string(),
        root_path,
        is_directory: kind == EntryKind::Directory,
    })
}

/// Join a client-reported save directory and torrent name into an absolute content path.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] when the name is not a single path component or
/// the save path is relative.
pub fn content_path(save_path: &Path, name: &str) -> FsOpsResult<PathBuf> {
    ensure_single_component(name)?;
    if !save_path.is_absolute() {
        return Err(FsOpsError::InvalidInput {
            field: "save_path",
            reason: "not_absolute",
            value: Some(save_path.to_string_lossy().into_owned()),
        });
    }
    Ok(save_path.join(name))
}

/// Reject names that would escape the directory they are joined onto.
pub(crate) fn ensure_single_component(name: &str) -> FsOpsResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(FsOpsError::InvalidInput {
            field: "name",
            reason: "not_a_single_component",
            value: Some(name.to_string()),
        }),
    }
}
