//! Filesystem abstraction used by the fan-out engine, locator, and reaper.
//!
//! # Design
//! - Narrow trait covering only the primitives the mirroring logic needs, so plans can be
//!   replayed against an in-memory tree in tests.
//! - [`LocalFilesystem`] is the production implementation over `std::fs` and `walkdir`.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::LinkEntry;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Kind of entry occupying a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file (or any non-directory entry such as a symlink).
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

/// Filesystem primitives consumed by the storage components.
pub trait Filesystem: Send + Sync {
    /// Kind of the entry at `path` without following symlinks; `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error for failures other than the path not existing.
    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>>;

    /// Every node beneath `root` (excluding `root` itself), parents before children.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be traversed.
    fn walk_tree(&self, root: &Path) -> FsOpsResult<Vec<LinkEntry>>;

    /// Create `path` and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create a hardlink at `link` pointing at the data of `original`.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Whether `first` and `second` are the same file (device and inode).
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error, including when either path is absent.
    fn same_file(&self, first: &Path, second: &Path) -> io::Result<bool>;

    /// Whether a hardlink from `original` can be placed at `destination`.
    ///
    /// `destination` need not exist; its nearest existing ancestor is consulted.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    fn same_device(&self, original: &Path, destination: &Path) -> io::Result<bool>;

    /// Remove a single file.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn walk_tree(&self, root: &Path) -> FsOpsResult<Vec<LinkEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|source| FsOpsError::walkdir("walk_tree", root, source))?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|_| FsOpsError::InvalidInput {
                    field: "content_root",
                    reason: "strip_prefix",
                    value: Some(entry.path().to_string_lossy().into_owned()),
                })?;
            entries.push(LinkEntry {
                relative_path: relative.to_path_buf(),
                is_directory: entry.file_type().is_dir(),
            });
        }
        Ok(entries)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        fs::hard_link(original, link)
    }

    #[cfg(unix)]
    fn same_file(&self, first: &Path, second: &Path) -> io::Result<bool> {
        let first = fs::symlink_metadata(first)?;
        let second = fs::symlink_metadata(second)?;
        Ok(first.dev() == second.dev() && first.ino() == second.ino())
    }

    // Without inode identity an existing entry cannot be proven to be a link.
    #[cfg(not(unix))]
    fn same_file(&self, _first: &Path, _second: &Path) -> io::Result<bool> {
        Ok(false)
    }

    #[cfg(unix)]
    fn same_device(&self, original: &Path, destination: &Path) -> io::Result<bool> {
        let origin_dev = fs::metadata(original)?.dev();
        let anchor = destination
            .ancestors()
            .find(|candidate| candidate.exists())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no existing ancestor"))?;
        Ok(fs::metadata(anchor)?.dev() == origin_dev)
    }

    #[cfg(not(unix))]
    fn same_device(&self, _original: &Path, _destination: &Path) -> io::Result<bool> {
        Ok(true)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}
