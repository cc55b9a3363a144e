//! Session seams consumed by the orchestrator.

use std::path::Path;

use async_trait::async_trait;

use crate::error::RemoteResult;
use crate::model::TorrentProperties;

/// Source of authenticated sessions.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Authenticate and open a session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::AuthFailure`] when credentials are refused and
    /// [`crate::RemoteError::Unreachable`] when the client cannot be reached.
    async fn login(&self) -> RemoteResult<Box<dyn RemoteSession>>;
}

/// Authenticated session reused for every call within one promotion run.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Read the save path, name, and category of a torrent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::NotFound`] for unknown hashes.
    async fn read_properties(&self, hash: &str) -> RemoteResult<TorrentProperties>;

    /// Point the client at a new save location for a torrent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::RemoteRejected`] when the client refuses the change.
    async fn set_location(&self, hash: &str, location: &Path) -> RemoteResult<()>;

    /// Assign a category to a torrent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::RemoteRejected`] when the client refuses the change.
    async fn set_category(&self, hash: &str, category: &str) -> RemoteResult<()>;

    /// Release the session. Failures are logged, never returned.
    async fn logout(&self);
}
