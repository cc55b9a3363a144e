//! Domain models for relocation and fan-out.
//!
//! # Design
//! - Plans are plain data computed before any mutation so they can be inspected and tested.
//! - Paths inside a [`LinkPlan`] are relative to the canonical content root.

use std::path::PathBuf;

/// Where a torrent's payload currently sits and what shape it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// Torrent name as reported by the download client; the last path component.
    pub name: String,
    /// Absolute path of the payload (save path joined with name).
    pub root_path: PathBuf,
    /// `true` for a directory tree, `false` for a single file.
    pub is_directory: bool,
}

/// Move of the original torrent's payload into the canonical root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    /// Current payload location.
    pub source: PathBuf,
    /// Canonical location: canonical root joined with the torrent name.
    pub destination: PathBuf,
}

/// One node of the canonical content tree to recreate under a duplicate's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Path relative to the canonical content root.
    pub relative_path: PathBuf,
    /// Directory nodes are created; file nodes are hardlinked.
    pub is_directory: bool,
}

/// Hardlink mirror of the canonical content for one duplicate torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPlan {
    /// Host component of the duplicate's announce URL, or the fallback literal.
    pub tracker_namespace: String,
    /// Fan-out root joined with the namespace and the duplicate's name.
    pub destination_root: PathBuf,
    /// Shape of the canonical content being mirrored.
    pub is_directory: bool,
    /// Walk order of the canonical tree; parents precede their children. Empty for files.
    pub entries: Vec<LinkEntry>,
}

impl LinkPlan {
    /// Directory the download client should treat as the duplicate's save path.
    #[must_use]
    pub fn save_location(&self) -> PathBuf {
        self.destination_root
            .parent()
            .map_or_else(|| self.destination_root.clone(), PathBuf::from)
    }

    /// Number of file entries that will be hardlinked.
    #[must_use]
    pub fn file_count(&self) -> usize {
        if self.is_directory {
            self.entries.iter().filter(|entry| !entry.is_directory).count()
        } else {
            1
        }
    }
}
