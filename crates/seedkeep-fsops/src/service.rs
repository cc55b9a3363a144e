//! Step-level instrumentation around the storage components.
//!
//! # Design
//! - Every component call runs through `execute_step`, which logs start, completion, and
//!   failure with the step name and bumps the `fsops_steps_total` counter.
//! - The service is synchronous; async callers move it onto a blocking thread.

use std::path::Path;
use std::sync::Arc;

use seedkeep_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::error::FsOpsResult;
use crate::fanout::{FanOutReport, fan_out};
use crate::fs::{Filesystem, LocalFilesystem};
use crate::locate::locate_content;
use crate::model::{ContentDescriptor, LinkPlan, RelocationPlan};
use crate::plan::plan_links;
use crate::reap::{ReapOutcome, reap};
use crate::relocate::{RelocationOutcome, relocate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepKind {
    Locate,
    Relocate,
    PlanLinks,
    FanOut,
    Reap,
}

impl StepKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Locate => "locate",
            Self::Relocate => "relocate",
            Self::PlanLinks => "plan_links",
            Self::FanOut => "fan_out",
            Self::Reap => "reap",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepStatus {
    Completed,
    Skipped,
    Failed,
}

impl StepStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Storage operations bound to a filesystem and an optional metrics registry.
#[derive(Clone)]
pub struct FsOpsService {
    fs: Arc<dyn Filesystem>,
    metrics: Option<Metrics>,
}

impl FsOpsService {
    /// Build a service over the given filesystem.
    #[must_use]
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self { fs, metrics: None }
    }

    /// Build a service over the local filesystem.
    #[must_use]
    pub fn local() -> Self {
        Self::new(Arc::new(LocalFilesystem))
    }

    /// Attach a metrics registry for step counters.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolve a torrent's on-disk content.
    ///
    /// # Errors
    ///
    /// Propagates [`locate_content`] failures.
    pub fn locate(&self, save_path: &Path, name: &str) -> FsOpsResult<ContentDescriptor> {
        self.execute_step(StepKind::Locate, || {
            let descriptor = locate_content(self.fs.as_ref(), save_path, name)?;
            debug!(
                path = %descriptor.root_path.display(),
                is_directory = descriptor.is_directory,
                "content located"
            );
            Ok((descriptor, StepStatus::Completed))
        })
    }

    /// Move content into the canonical root.
    ///
    /// # Errors
    ///
    /// Propagates [`relocate`] failures.
    pub fn relocate(&self, plan: &RelocationPlan) -> FsOpsResult<RelocationOutcome> {
        self.execute_step(StepKind::Relocate, || {
            let outcome = relocate(plan)?;
            info!(
                source = %plan.source.display(),
                destination = %plan.destination.display(),
                outcome = outcome.as_str(),
                "content relocated"
            );
            let status = if outcome == RelocationOutcome::AlreadyInPlace {
                StepStatus::Skipped
            } else {
                StepStatus::Completed
            };
            Ok((outcome, status))
        })
    }

    /// Plan the hardlink mirror for one duplicate.
    ///
    /// # Errors
    ///
    /// Propagates [`plan_links`] failures.
    pub fn plan_links(
        &self,
        canonical: &ContentDescriptor,
        duplicate_name: &str,
        announce_url: Option<&str>,
        cross_seed_root: &Path,
    ) -> FsOpsResult<LinkPlan> {
        self.execute_step(StepKind::PlanLinks, || {
            let plan = plan_links(
                self.fs.as_ref(),
                canonical,
                duplicate_name,
                announce_url,
                cross_seed_root,
            )?;
            Ok((plan, StepStatus::Completed))
        })
    }

    /// Materialise a link plan.
    ///
    /// # Errors
    ///
    /// Propagates [`fan_out`] failures.
    pub fn fan_out(&self, canonical_root: &Path, plan: &LinkPlan) -> FsOpsResult<FanOutReport> {
        self.execute_step(StepKind::FanOut, || {
            let report = fan_out(self.fs.as_ref(), canonical_root, plan)?;
            info!(
                destination = %plan.destination_root.display(),
                tracker = %plan.tracker_namespace,
                linked = report.linked,
                already_present = report.already_present,
                "hardlinks in place"
            );
            Ok((report, StepStatus::Completed))
        })
    }

    /// Remove superseded duplicate content.
    ///
    /// # Errors
    ///
    /// Propagates [`reap`] failures.
    pub fn reap(&self, target: &Path, protected: &[&Path]) -> FsOpsResult<ReapOutcome> {
        self.execute_step(StepKind::Reap, || {
            let outcome = reap(self.fs.as_ref(), target, protected)?;
            info!(
                target = %target.display(),
                outcome = outcome.as_str(),
                "duplicate content reaped"
            );
            let status = if outcome == ReapOutcome::Removed {
                StepStatus::Completed
            } else {
                StepStatus::Skipped
            };
            Ok((outcome, status))
        })
    }

    fn execute_step<T, F>(&self, step: StepKind, op: F) -> FsOpsResult<T>
    where
        F: FnOnce() -> FsOpsResult<(T, StepStatus)>,
    {
        debug!(step = step.as_str(), "fsops step started");
        match op() {
            Ok((value, status)) => {
                debug!(step = step.as_str(), status = status.as_str(), "fsops step finished");
                self.record(step, status);
                Ok(value)
            }
            Err(err) => {
                warn!(step = step.as_str(), error = %err, "fsops step failed");
                self.record(step, StepStatus::Failed);
                Err(err)
            }
        }
    }

    fn record(&self, step: StepKind, status: StepStatus) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_fsops_step(step.as_str(), status.as_str());
        }
    }
}
