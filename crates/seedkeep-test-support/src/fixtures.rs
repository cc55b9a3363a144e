//! Scratch directories for tests that touch the real filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Workspace-local directory that holds every scratch tree.
///
/// Keeping scratch data next to the checkout puts canonical and fan-out trees on one
/// filesystem, which hardlink tests require.
#[must_use]
pub fn server_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .join(".server_root")
}

/// Create a fresh scratch directory removed when the handle drops.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn scratch_dir(prefix: &str) -> io::Result<TempDir> {
    let root = server_root();
    fs::create_dir_all(&root)?;
    tempfile::Builder::new()
        .prefix(&format!("seedkeep-{prefix}-"))
        .tempdir_in(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dirs_live_under_server_root() -> io::Result<()> {
        let dir = scratch_dir("fixtures")?;
        assert!(dir.path().starts_with(server_root()));
        assert!(dir.path().is_dir());
        let name = dir.path().file_name().and_then(|name| name.to_str());
        assert!(name.is_some_and(|name| name.starts_with("seedkeep-fixtures-")));
        Ok(())
    }
}
