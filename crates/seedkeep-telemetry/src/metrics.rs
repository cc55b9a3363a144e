//! Prometheus-backed metrics registry.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Labels are low-cardinality verdicts and step names, never hashes or paths.

use std::sync::Arc;

use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    webhook_verdicts_total: IntCounterVec,
    fsops_steps_total: IntCounterVec,
    duplicates_linked_total: IntCounter,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let webhook_verdicts_total = IntCounterVec::new(
            Opts::new(
                "webhook_verdicts_total",
                "Cross-seed notifications handled by verdict",
            ),
            &["verdict"],
        )
        .map_err(|source| register_error("webhook_verdicts_total", source))?;
        let fsops_steps_total = IntCounterVec::new(
            Opts::new(
                "fsops_steps_total",
                "Storage operations executed by step and status",
            ),
            &["step", "status"],
        )
        .map_err(|source| register_error("fsops_steps_total", source))?;
        let duplicates_linked_total = IntCounter::with_opts(Opts::new(
            "duplicates_linked_total",
            "Duplicate torrents fanned out into tracker namespaces",
        ))
        .map_err(|source| register_error("duplicates_linked_total", source))?;

        registry
            .register(Box::new(webhook_verdicts_total.clone()))
            .map_err(|source| register_error("webhook_verdicts_total", source))?;
        registry
            .register(Box::new(fsops_steps_total.clone()))
            .map_err(|source| register_error("fsops_steps_total", source))?;
        registry
            .register(Box::new(duplicates_linked_total.clone()))
            .map_err(|source| register_error("duplicates_linked_total", source))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                webhook_verdicts_total,
                fsops_steps_total,
                duplicates_linked_total,
            }),
        })
    }

    /// Count a webhook verdict (`promoted`, `failed`, `ignored`, `rejected`, `busy`).
    pub fn inc_webhook_verdict(&self, verdict: &str) {
        self.inner
            .webhook_verdicts_total
            .with_label_values(&[verdict])
            .inc();
    }

    /// Count a storage step outcome.
    pub fn inc_fsops_step(&self, step: &str, status: &str) {
        self.inner
            .fsops_steps_total
            .with_label_values(&[step, status])
            .inc();
    }

    /// Count a duplicate whose fan-out completed.
    pub fn inc_duplicate_linked(&self) {
        self.inner.duplicates_linked_total.inc();
    }

    /// Render all metrics in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be encoded.
    pub fn render(&self) -> Result<String> {
        let mut text = String::new();
        TextEncoder::new()
            .encode_utf8(&self.inner.registry.gather(), &mut text)
            .map_err(|source| TelemetryError::MetricsRender { source })?;
        Ok(text)
    }
}

const fn register_error(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsRegister { name, source }
}
