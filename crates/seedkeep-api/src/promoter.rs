//! Seam between the webhook surface and the promotion core.

use async_trait::async_trait;

/// A torrent known to the download client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentRef {
    /// Info hash.
    pub hash: String,
    /// Display name, for logs only.
    pub name: String,
}

/// A newly matched duplicate and the announce URL of its tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRef {
    /// Info hash of the duplicate torrent.
    pub hash: String,
    /// Announce URL; `None` when the notification left it blank.
    pub announce_url: Option<String>,
}

/// Everything the core needs for one promotion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRequest {
    /// Torrent whose content becomes canonical.
    pub original: TorrentRef,
    /// Duplicates to mirror, processed in order.
    pub duplicates: Vec<DuplicateRef>,
}

/// Single pass/fail verdict reported back to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionVerdict {
    /// Storage and client state were fully reconciled.
    Promoted,
    /// The run stopped at a failure.
    Failed,
}

impl PromotionVerdict {
    /// Metrics label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Promoted => "promoted",
            Self::Failed => "failed",
        }
    }
}

/// Runs a promotion to completion.
#[async_trait]
pub trait Promoter: Send + Sync + 'static {
    /// Execute one promotion run.
    async fn promote(&self, request: PromotionRequest) -> PromotionVerdict;
}
