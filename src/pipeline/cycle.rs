// src/pipeline/cycle.rs

//! One pass over every target: fetch, fingerprint, detect, notify, persist.
//!
//! Targets are handled independently. A failure on one target is recorded
//! in the report and status and never touches another target's baseline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::Decision;
use crate::services::{Fingerprinter, Notifier, PageFetcher, format_alert};
use crate::status::StatusReporter;
use crate::storage::StateStore;

/// What happened to one target during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TargetOutcome {
    /// Baseline stored for the first time
    FirstObservation { documents: usize },
    /// Digest matched the baseline
    Unchanged { documents: usize },
    /// Digest differed; baseline replaced
    Changed {
        documents: usize,
        new_documents: Vec<String>,
        notified: bool,
    },
    /// Fetch or fingerprinting failed; nothing was changed
    Failed { kind: String, error: String },
}

/// Per-target line of a [`CycleReport`].
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: String,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
    /// Non-fatal problems such as failed saves or undelivered alerts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl TargetReport {
    fn failed(target: String, error: &AppError) -> Self {
        Self {
            target,
            outcome: TargetOutcome::Failed {
                kind: error.kind().to_string(),
                error: error.to_string(),
            },
            warnings: Vec::new(),
        }
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub targets: Vec<TargetReport>,
}

impl CycleReport {
    pub fn changed_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| matches!(t.outcome, TargetOutcome::Changed { .. }))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.errors().len()
    }

    /// Failure descriptions of this cycle, one per failed target.
    pub fn errors(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter_map(|t| match &t.outcome {
                TargetOutcome::Failed { error, .. } => Some(error.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Runs cycles over a fixed set of targets.
pub struct CycleRunner {
    targets: Vec<String>,
    fetcher: Arc<dyn PageFetcher>,
    fingerprinter: Fingerprinter,
    notifier: Arc<dyn Notifier>,
    recipient: String,
    store: Arc<StateStore>,
    status: Arc<StatusReporter>,
    max_concurrent: usize,
    max_listed_documents: usize,
}

impl CycleRunner {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
        store: Arc<StateStore>,
        status: Arc<StatusReporter>,
    ) -> Self {
        Self {
            targets: config.monitor.targets.clone(),
            fetcher,
            fingerprinter: Fingerprinter::new(config.monitor.site_origin.clone()),
            notifier,
            recipient: config
                .notifier
                .chat_id
                .clone()
                .unwrap_or_else(|| "log".to_string()),
            store,
            status,
            max_concurrent: config.http.max_concurrent.max(1),
            max_listed_documents: config.notifier.max_listed_documents,
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn status(&self) -> &Arc<StatusReporter> {
        &self.status
    }

    /// Run one cycle over all targets and close it on the status reporter.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        log::info!("Cycle started for {} targets", self.targets.len());

        let targets = self.process_all(&self.targets, true).await;

        let finished_at = Utc::now();
        let report = CycleReport {
            started_at,
            finished_at,
            targets,
        };
        self.status.finish_cycle(finished_at, &report.errors()).await;

        log::info!(
            "Cycle finished: {} checked, {} changed, {} failed",
            report.targets.len(),
            report.changed_count(),
            report.failure_count()
        );
        report
    }

    /// Store a baseline for every target that has none, without alerts.
    pub async fn initialize(&self) -> CycleReport {
        let started_at = Utc::now();
        let missing = self.store.missing(&self.targets).await;
        log::info!("Initializing baselines for {} targets", missing.len());

        let targets = self.process_all(&missing, false).await;

        if let Err(e) = self.store.persist().await {
            log::error!("[{}] Failed to save initial state: {}", e.kind(), e);
        }

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            targets,
        };
        self.status.record_errors(&report.errors()).await;
        log::info!(
            "Initialization finished: {} baselines stored, {} failed",
            report.targets.len() - report.failure_count(),
            report.failure_count()
        );
        report
    }

    /// Run one cycle on its own task so that a panic inside it is caught
    /// at the cycle boundary and recorded instead of unwinding the caller.
    pub async fn run_isolated(self: &Arc<Self>) -> Result<CycleReport> {
        let runner = Arc::clone(self);
        match tokio::spawn(async move { runner.run_cycle().await }).await {
            Ok(report) => Ok(report),
            Err(e) => {
                let err = AppError::Cycle(e.to_string());
                log::error!("{}", err);
                self.status.record_fatal(err.to_string()).await;
                Err(err)
            }
        }
    }

    async fn process_all(&self, targets: &[String], notify: bool) -> Vec<TargetReport> {
        let pending: Vec<_> = targets
            .iter()
            .map(|target| self.process_target(target.clone(), notify))
            .collect();

        stream::iter(pending)
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    async fn process_target(&self, target: String, notify: bool) -> TargetReport {
        // Held until the report is built; overlapping cycles take turns per target.
        let _step = self.store.lock_target(&target).await;

        let body = match self.fetcher.fetch(&target).await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("[{}] {} skipped this cycle: {}", e.kind(), target, e);
                return TargetReport::failed(target, &e);
            }
        };

        let current = match self.fingerprinter.fingerprint(&target, &body) {
            Ok(fp) => fp,
            Err(e) => {
                log::warn!("[{}] {} skipped this cycle: {}", e.kind(), target, e);
                return TargetReport::failed(target, &e);
            }
        };
        let documents = current.document_count();

        let reconciliation = self.store.reconcile(&target, current).await;
        let mut warnings = Vec::new();
        if let Some(e) = &reconciliation.persist_error {
            warnings.push(e.to_string());
        }
        let baseline_written = reconciliation.decision.writes_baseline();

        let outcome = match reconciliation.decision {
            Decision::FirstObservation => {
                log::info!("First observation of {}: {} documents", target, documents);
                TargetOutcome::FirstObservation { documents }
            }
            Decision::Unchanged => {
                log::info!("No change at {}", target);
                TargetOutcome::Unchanged { documents }
            }
            Decision::Changed { new_documents } => {
                log::info!(
                    "Change detected at {} ({} new documents)",
                    target,
                    new_documents.len()
                );
                let notified = if notify {
                    match self.notify(&target, &new_documents).await {
                        Ok(()) => true,
                        Err(e) => {
                            warnings.push(e.to_string());
                            false
                        }
                    }
                } else {
                    false
                };
                TargetOutcome::Changed {
                    documents,
                    new_documents,
                    notified,
                }
            }
        };

        self.status
            .record_observation(&target, documents, baseline_written, Utc::now())
            .await;

        TargetReport {
            target,
            outcome,
            warnings,
        }
    }

    async fn notify(&self, target: &str, new_documents: &[String]) -> Result<()> {
        let text = format_alert(target, new_documents, self.max_listed_documents);
        self.notifier
            .send(&self.recipient, &text)
            .await
            .inspect_err(|e| {
                log::error!("[{}] Alert for {} not delivered: {}", e.kind(), target, e)
            })
    }
}
