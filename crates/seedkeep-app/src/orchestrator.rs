//! Promotion orchestrator.
//!
//! # Design
//! - Linear state machine: authenticate, consolidate the original, mirror each duplicate in
//!   order, then promote the original's category. The first failure is absorbing and
//!   nothing already done is rolled back.
//! - One remote session per run, released on every exit path.
//! - Storage work is synchronous and runs on the blocking pool.
//! - A duplicate's content is reaped only after its links exist, and never when it overlaps
//!   the links or the canonical content. Client-reported paths must be absolute before
//!   anything is derived from them.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use seedkeep_api::{DuplicateRef, PromotionRequest, PromotionVerdict, Promoter};
use seedkeep_config::PromoterConfig;
use seedkeep_fsops::{
    ContentDescriptor, FsOpsResult, FsOpsService, RelocationOutcome, content_path,
    plan_relocation,
};
use seedkeep_qbit::{RemoteClient, RemoteSession};
use seedkeep_telemetry::Metrics;
use tracing::{Instrument, error, info, info_span};

use crate::error::{AppError, AppResult, FailureKind};

/// States of a promotion run, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing done yet.
    Start,
    /// Remote session open.
    Authenticated,
    /// Original content found on disk.
    OriginalLocated,
    /// Original content sits in the canonical root.
    OriginalRelocated,
    /// Client points at the canonical location.
    OriginalRemoteUpdated,
    /// Current duplicate's properties read.
    DuplicateLocated,
    /// Current duplicate's links created.
    DuplicateLinked,
    /// Current duplicate's superseded content removed.
    DuplicateReaped,
    /// Client points the current duplicate at its links.
    DuplicateRemoteUpdated,
    /// Original moved to the promoted category.
    CategoryPromoted,
    /// Run complete.
    Done,
}

impl Stage {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Authenticated => "authenticated",
            Self::OriginalLocated => "original_located",
            Self::OriginalRelocated => "original_relocated",
            Self::OriginalRemoteUpdated => "original_remote_updated",
            Self::DuplicateLocated => "duplicate_located",
            Self::DuplicateLinked => "duplicate_linked",
            Self::DuplicateReaped => "duplicate_reaped",
            Self::DuplicateRemoteUpdated => "duplicate_remote_updated",
            Self::CategoryPromoted => "category_promoted",
            Self::Done => "done",
        }
    }
}

/// The failure that stopped a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    /// Taxonomy bucket.
    pub kind: FailureKind,
    /// Last stage reached before the failure.
    pub stage: Stage,
    /// Error message including its source chain.
    pub message: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationResult {
    /// Whether every step completed.
    pub success: bool,
    /// Duplicates fully processed (linked, reaped, and relabelled).
    pub processed_duplicates: usize,
    /// First failure encountered, if any.
    pub first_failure: Option<FailureDetail>,
    /// Last stage reached.
    pub stage: Stage,
}

struct Progress<'a> {
    hash: &'a str,
    stage: Stage,
    processed_duplicates: usize,
}

impl Progress<'_> {
    fn reach(&mut self, stage: Stage) {
        self.stage = stage;
        info!(info_hash = %self.hash, stage = stage.as_str(), "promotion stage reached");
    }
}

/// Drives a promotion run against the download client and the storage components.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<PromoterConfig>,
    remote: Arc<dyn RemoteClient>,
    fsops: FsOpsService,
    metrics: Metrics,
}

impl Orchestrator {
    /// Assemble an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        config: Arc<PromoterConfig>,
        remote: Arc<dyn RemoteClient>,
        fsops: FsOpsService,
        metrics: Metrics,
    ) -> Self {
        Self {
            config,
            remote,
            fsops,
            metrics,
        }
    }

    /// Execute one promotion run to completion or first failure.
    pub async fn run(&self, request: &PromotionRequest) -> OrchestrationResult {
        let span = info_span!(
            "promotion",
            info_hash = %request.original.hash,
            name = %request.original.name,
            duplicates = request.duplicates.len()
        );
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &PromotionRequest) -> OrchestrationResult {
        let mut progress = Progress {
            hash: &request.original.hash,
            stage: Stage::Start,
            processed_duplicates: 0,
        };

        let outcome = match self.remote.login().await {
            Ok(session) => {
                progress.reach(Stage::Authenticated);
                let outcome = self.drive(session.as_ref(), request, &mut progress).await;
                session.logout().await;
                outcome
            }
            Err(err) => Err(AppError::remote("auth.login", &request.original.hash, err)),
        };

        match outcome {
            Ok(()) => {
                progress.reach(Stage::Done);
                OrchestrationResult {
                    success: true,
                    processed_duplicates: progress.processed_duplicates,
                    first_failure: None,
                    stage: progress.stage,
                }
            }
            Err(err) => {
                let detail = FailureDetail {
                    kind: err.kind(),
                    stage: progress.stage,
                    message: error_chain(&err),
                };
                error!(
                    kind = detail.kind.as_str(),
                    stage = detail.stage.as_str(),
                    processed_duplicates = progress.processed_duplicates,
                    error = %detail.message,
                    "promotion failed"
                );
                OrchestrationResult {
                    success: false,
                    processed_duplicates: progress.processed_duplicates,
                    first_failure: Some(detail),
                    stage: progress.stage,
                }
            }
        }
    }

    async fn drive(
        &self,
        session: &dyn RemoteSession,
        request: &PromotionRequest,
        progress: &mut Progress<'_>,
    ) -> AppResult<()> {
        let hash = request.original.hash.as_str();
        let canonical = self.consolidate_original(session, hash, progress).await?;

        for duplicate in &request.duplicates {
            self.mirror_duplicate(session, &canonical, duplicate, progress)
                .await?;
            progress.processed_duplicates += 1;
            self.metrics.inc_duplicate_linked();
        }

        session
            .set_category(hash, &self.config.promote_category)
            .await
            .map_err(|err| AppError::remote("set_category", hash, err))?;
        progress.reach(Stage::CategoryPromoted);
        Ok(())
    }

    async fn consolidate_original(
        &self,
        session: &dyn RemoteSession,
        hash: &str,
        progress: &mut Progress<'_>,
    ) -> AppResult<ContentDescriptor> {
        let properties = session
            .read_properties(hash)
            .await
            .map_err(|err| AppError::remote("read_properties", hash, err))?;

        let save_path = properties.save_path.clone();
        let name = properties.name.clone();
        let located = self
            .blocking("locate", move |fsops| fsops.locate(&save_path, &name))
            .await?;
        progress.reach(Stage::OriginalLocated);

        let canonical_root = self.config.storage.canonical_root.clone();
        let plan = plan_relocation(&located, &canonical_root)
            .map_err(|err| AppError::fsops("plan_relocation", err))?;
        let relocation = plan.clone();
        let outcome = self
            .blocking("relocate", move |fsops| fsops.relocate(&relocation))
            .await?;
        if outcome == RelocationOutcome::AlreadyInPlace {
            info!(path = %plan.destination.display(), "original already in canonical root");
        }
        progress.reach(Stage::OriginalRelocated);

        session
            .set_location(hash, &canonical_root)
            .await
            .map_err(|err| AppError::remote("set_location", hash, err))?;
        progress.reach(Stage::OriginalRemoteUpdated);

        Ok(ContentDescriptor {
            name: located.name,
            root_path: plan.destination,
            is_directory: located.is_directory,
        })
    }

    async fn mirror_duplicate(
        &self,
        session: &dyn RemoteSession,
        canonical: &ContentDescriptor,
        duplicate: &DuplicateRef,
        progress: &mut Progress<'_>,
    ) -> AppResult<()> {
        let hash = duplicate.hash.as_str();
        let properties = session
            .read_properties(hash)
            .await
            .map_err(|err| AppError::remote("read_properties", hash, err))?;
        let materialized = content_path(&properties.save_path, &properties.name)
            .map_err(|err| AppError::fsops("locate_duplicate", err))?;
        progress.reach(Stage::DuplicateLocated);

        let link_source = canonical.clone();
        let cross_seed_root = self.config.storage.cross_seed_root.clone();
        let announce_url = duplicate.announce_url.clone();
        let duplicate_name = properties.name.clone();
        let plan = self
            .blocking("plan_links", move |fsops| {
                fsops.plan_links(
                    &link_source,
                    &duplicate_name,
                    announce_url.as_deref(),
                    &cross_seed_root,
                )
            })
            .await?;

        let canonical_root = canonical.root_path.clone();
        let links = plan.clone();
        self.blocking("fan_out", move |fsops| fsops.fan_out(&canonical_root, &links))
            .await?;
        info!(
            duplicate_hash = %hash,
            tracker = %plan.tracker_namespace,
            path = %plan.destination_root.display(),
            files = plan.file_count(),
            "duplicate linked"
        );
        progress.reach(Stage::DuplicateLinked);

        let linked_root = plan.destination_root.clone();
        let canonical_root = canonical.root_path.clone();
        let target = materialized.clone();
        self.blocking("reap", move |fsops| {
            fsops.reap(&target, &[linked_root.as_path(), canonical_root.as_path()])
        })
        .await?;
        progress.reach(Stage::DuplicateReaped);

        session
            .set_location(hash, &plan.save_location())
            .await
            .map_err(|err| AppError::remote("set_location", hash, err))?;
        info!(
            duplicate_hash = %hash,
            from = %materialized.display(),
            to = %plan.save_location().display(),
            "duplicate relocated in client"
        );
        progress.reach(Stage::DuplicateRemoteUpdated);
        Ok(())
    }

    async fn blocking<T, F>(&self, operation: &'static str, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(FsOpsService) -> FsOpsResult<T> + Send + 'static,
    {
        let fsops = self.fsops.clone();
        tokio::task::spawn_blocking(move || op(fsops))
            .await
            .map_err(|source| AppError::Join { operation, source })?
            .map_err(|err| AppError::fsops(operation, err))
    }
}

#[async_trait]
impl Promoter for Orchestrator {
    async fn promote(&self, request: PromotionRequest) -> PromotionVerdict {
        if self.run(&request).await.success {
            PromotionVerdict::Promoted
        } else {
            PromotionVerdict::Failed
        }
    }
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
