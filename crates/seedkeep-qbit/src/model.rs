//! Torrent properties as reported by the client.

use std::path::PathBuf;

use serde::Deserialize;

/// Subset of a torrent's properties needed to locate and relabel it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentProperties {
    /// Info hash the properties were read for.
    pub hash: String,
    /// Torrent name; the top-level file or directory of its content.
    pub name: String,
    /// Directory the content is saved under.
    pub save_path: PathBuf,
    /// Current category, empty when uncategorised.
    pub category: String,
}

/// One element of the `torrents/info` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TorrentInfo {
    pub(crate) hash: String,
    pub(crate) name: String,
    pub(crate) save_path: String,
    #[serde(default)]
    pub(crate) category: String,
}

impl From<TorrentInfo> for TorrentProperties {
    fn from(info: TorrentInfo) -> Self {
        Self {
            hash: info.hash,
            name: info.name,
            save_path: PathBuf::from(info.save_path),
            category: info.category,
        }
    }
}
