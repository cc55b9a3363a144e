//! In-process stand-in for the download client.
//!
//! `RecordingRemote` keeps a table of torrents, applies mutations to it, records every
//! call in order, and can be told to refuse logins or specific mutations.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use seedkeep_qbit::{RemoteClient, RemoteError, RemoteResult, RemoteSession, TorrentProperties};

/// A call observed by the fake client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// Session opened.
    Login,
    /// Properties read for a hash.
    ReadProperties {
        /// Requested hash.
        hash: String,
    },
    /// Save location changed.
    SetLocation {
        /// Target hash.
        hash: String,
        /// New location.
        location: PathBuf,
    },
    /// Category changed.
    SetCategory {
        /// Target hash.
        hash: String,
        /// New category.
        category: String,
    },
    /// Session released.
    Logout,
}

impl RemoteCall {
    /// Whether the call changes client state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::SetLocation { .. } | Self::SetCategory { .. })
    }
}

#[derive(Default)]
struct RemoteState {
    torrents: HashMap<String, TorrentProperties>,
    calls: Vec<RemoteCall>,
    refuse_login: bool,
    rejected_locations: HashSet<String>,
    rejected_categories: HashSet<String>,
}

/// Recording fake implementing [`RemoteClient`].
#[derive(Clone, Default)]
pub struct RecordingRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl RecordingRemote {
    /// Empty client with no torrents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a torrent.
    #[must_use]
    pub fn with_torrent(self, hash: &str, name: &str, save_path: &Path, category: &str) -> Self {
        self.lock().torrents.insert(
            hash.to_string(),
            TorrentProperties {
                hash: hash.to_string(),
                name: name.to_string(),
                save_path: save_path.to_path_buf(),
                category: category.to_string(),
            },
        );
        self
    }

    /// Refuse every login with `AuthFailure`.
    #[must_use]
    pub fn refusing_login(self) -> Self {
        self.lock().refuse_login = true;
        self
    }

    /// Reject `setLocation` for one hash.
    #[must_use]
    pub fn rejecting_location(self, hash: &str) -> Self {
        self.lock().rejected_locations.insert(hash.to_string());
        self
    }

    /// Reject `setCategory` for one hash.
    #[must_use]
    pub fn rejecting_category(self, hash: &str) -> Self {
        self.lock().rejected_categories.insert(hash.to_string());
        self
    }

    /// Current view of a torrent, including applied mutations.
    #[must_use]
    pub fn torrent(&self, hash: &str) -> Option<TorrentProperties> {
        self.lock().torrents.get(hash).cloned()
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Only the state-changing calls, in order.
    #[must_use]
    pub fn mutations(&self) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(RemoteCall::is_mutation)
            .collect()
    }
}

#[async_trait]
impl RemoteClient for RecordingRemote {
    async fn login(&self) -> RemoteResult<Box<dyn RemoteSession>> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::Login);
        if state.refuse_login {
            return Err(RemoteError::AuthFailure { status: 200 });
        }
        drop(state);
        Ok(Box::new(RecordingSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct RecordingSession {
    state: Arc<Mutex<RemoteState>>,
}

impl RecordingSession {
    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RemoteSession for RecordingSession {
    async fn read_properties(&self, hash: &str) -> RemoteResult<TorrentProperties> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::ReadProperties {
            hash: hash.to_string(),
        });
        state
            .torrents
            .get(hash)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                hash: hash.to_string(),
            })
    }

    async fn set_location(&self, hash: &str, location: &Path) -> RemoteResult<()> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::SetLocation {
            hash: hash.to_string(),
            location: location.to_path_buf(),
        });
        if state.rejected_locations.contains(hash) {
            return Err(RemoteError::RemoteRejected {
                operation: "torrents.setLocation",
                status: 409,
            });
        }
        match state.torrents.get_mut(hash) {
            Some(torrent) => {
                torrent.save_path = location.to_path_buf();
                Ok(())
            }
            None => Err(RemoteError::RemoteRejected {
                operation: "torrents.setLocation",
                status: 404,
            }),
        }
    }

    async fn set_category(&self, hash: &str, category: &str) -> RemoteResult<()> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::SetCategory {
            hash: hash.to_string(),
            category: category.to_string(),
        });
        if state.rejected_categories.contains(hash) {
            return Err(RemoteError::RemoteRejected {
                operation: "torrents.setCategory",
                status: 409,
            });
        }
        match state.torrents.get_mut(hash) {
            Some(torrent) => {
                torrent.category = category.to_string();
                Ok(())
            }
            None => Err(RemoteError::RemoteRejected {
                operation: "torrents.setCategory",
                status: 404,
            }),
        }
    }

    async fn logout(&self) {
        self.lock().calls.push(RemoteCall::Logout);
    }
}
