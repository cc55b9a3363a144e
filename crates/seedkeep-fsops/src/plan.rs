//! Path planning for relocation and fan-out.
//!
//! # Design
//! - Planning never mutates the filesystem; the only IO is the walk of the canonical tree.
//! - Destinations are deterministic; collisions are left for the executing component to report.

use std::path::Path;

use url::Url;

use crate::error::FsOpsResult;
use crate::fs::Filesystem;
use crate::locate::ensure_single_component;
use crate::model::{ContentDescriptor, LinkPlan, RelocationPlan};

/// Namespace used when an announce URL is absent or has no usable host.
pub const UNKNOWN_TRACKER: &str = "unknown-tracker";

/// Derive the tracker namespace from an announce URL.
///
/// `https://tracker.example.com:443/announce` yields `tracker.example.com`; anything
/// unparsable, host-less, or empty yields [`UNKNOWN_TRACKER`].
#[must_use]
pub fn tracker_namespace(announce_url: Option<&str>) -> String {
    announce_url
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| Url::parse(raw).ok())
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .filter(|host| !host.is_empty() && ensure_single_component(host).is_ok())
        .unwrap_or_else(|| UNKNOWN_TRACKER.to_string())
}

/// Plan the move of the original payload to `canonical_root/<name>`.
///
/// # Errors
///
/// Returns [`crate::FsOpsError::InvalidInput`] when the torrent name is not a single path
/// component.
pub fn plan_relocation(
    descriptor: &ContentDescriptor,
    canonical_root: &Path,
) -> FsOpsResult<RelocationPlan> {
    ensure_single_component(&descriptor.name)?;
    Ok(RelocationPlan {
        source: descriptor.root_path.clone(),
        destination: canonical_root.join(&descriptor.name),
    })
}

/// Plan the hardlink mirror of the canonical content for one duplicate.
///
/// `canonical` describes the content at its canonical location; its tree, not the
/// duplicate's, defines the entries.
///
/// # Errors
///
/// Returns an error when the duplicate name is not a single path component or the
/// canonical tree cannot be walked.
pub fn plan_links(
    fs: &dyn Filesystem,
    canonical: &ContentDescriptor,
    duplicate_name: &str,
    announce_url: Option<&str>,
    cross_seed_root: &Path,
) -> FsOpsResult<LinkPlan> {
    ensure_single_component(duplicate_name)?;
    let tracker_namespace = tracker_namespace(announce_url);
    let destination_root = cross_seed_root
        .join(&tracker_namespace)
        .join(duplicate_name);
    let entries = if canonical.is_directory {
        fs.walk_tree(&canonical.root_path)?
    } else {
        Vec::new()
    };

    Ok(LinkPlan {
        tracker_namespace,
        destination_root,
        is_directory: canonical.is_directory,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FsOpsError;
    use crate::fs::LocalFilesystem;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn namespace_uses_announce_host() {
        assert_eq!(
            tracker_namespace(Some("https://tracker.example.com:443/announce")),
            "tracker.example.com"
        );
        assert_eq!(
            tracker_namespace(Some("udp://Open.Tracker.ORG:1337/announce?passkey=abc")),
            "open.tracker.org"
        );
    }

    #[test]
    fn namespace_falls_back_for_unusable_urls() {
        for raw in [None, Some(""), Some("   "), Some("not a url"), Some("mailto:ops")] {
            assert_eq!(tracker_namespace(raw), UNKNOWN_TRACKER, "{raw:?}");
        }
    }

    #[test]
    fn relocation_targets_canonical_root() -> anyhow::Result<()> {
        let descriptor = ContentDescriptor {
            name: "Release.2024".to_string(),
            root_path: PathBuf::from("/downloads/race/Release.2024"),
            is_directory: true,
        };
        let plan = plan_relocation(&descriptor, Path::new("/data/longterm"))?;
        assert_eq!(plan.source, PathBuf::from("/downloads/race/Release.2024"));
        assert_eq!(plan.destination, PathBuf::from("/data/longterm/Release.2024"));
        Ok(())
    }

    #[test]
    fn link_plan_mirrors_canonical_tree() -> anyhow::Result<()> {
        let temp = seedkeep_test_support::scratch_dir("plan-links")?;
        let canonical_root = temp.path().join("longterm/Release");
        fs::create_dir_all(canonical_root.join("Subs"))?;
        fs::write(canonical_root.join("Subs/en.srt"), b"subs")?;
        fs::write(canonical_root.join("video.mkv"), b"video")?;
        let canonical = ContentDescriptor {
            name: "Release".to_string(),
            root_path: canonical_root,
            is_directory: true,
        };

        let plan = plan_links(
            &LocalFilesystem,
            &canonical,
            "Release.Alt",
            Some("https://tracker.example.com/announce"),
            &temp.path().join("cross-seed"),
        )?;
        assert_eq!(plan.tracker_namespace, "tracker.example.com");
        assert_eq!(
            plan.destination_root,
            temp.path().join("cross-seed/tracker.example.com/Release.Alt")
        );
        assert_eq!(plan.save_location(), temp.path().join("cross-seed/tracker.example.com"));
        assert_eq!(plan.entries.len(), 3);
        assert_eq!(plan.file_count(), 2);
        Ok(())
    }

    #[test]
    fn link_plan_for_single_file_has_no_entries() -> anyhow::Result<()> {
        let canonical = ContentDescriptor {
            name: "movie.mkv".to_string(),
            root_path: PathBuf::from("/data/longterm/movie.mkv"),
            is_directory: false,
        };
        let plan = plan_links(
            &LocalFilesystem,
            &canonical,
            "movie.mkv",
            None,
            Path::new("/data/cross-seed"),
        )?;
        assert!(plan.entries.is_empty());
        assert_eq!(plan.file_count(), 1);
        assert_eq!(
            plan.destination_root,
            PathBuf::from("/data/cross-seed/unknown-tracker/movie.mkv")
        );
        Ok(())
    }

    #[test]
    fn link_plan_rejects_traversing_names() {
        let canonical = ContentDescriptor {
            name: "movie.mkv".to_string(),
            root_path: PathBuf::from("/data/longterm/movie.mkv"),
            is_directory: false,
        };
        assert!(matches!(
            plan_links(&LocalFilesystem, &canonical, "..", None, Path::new("/x")),
            Err(FsOpsError::InvalidInput { .. })
        ));
    }
}
