// src/status.rs

//! Status reporter: the single owner of [`CycleStatus`].
//!
//! Cycles write through the methods here; the status surface only ever
//! reads cloned snapshots.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{CycleStatus, TargetStatus};

#[derive(Debug, Default)]
pub struct StatusReporter {
    inner: RwLock<CycleStatus>,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current status.
    pub async fn snapshot(&self) -> CycleStatus {
        self.inner.read().await.clone()
    }

    /// Record a successful observation of `target`.
    pub async fn record_observation(
        &self,
        target: &str,
        document_count: usize,
        baseline_written: bool,
        at: DateTime<Utc>,
    ) {
        let mut status = self.inner.write().await;
        let previous_change = status
            .targets
            .get(target)
            .and_then(|entry| entry.last_change_at);

        status.targets.insert(
            target.to_string(),
            TargetStatus {
                document_count,
                last_observed_at: at,
                last_change_at: if baseline_written {
                    Some(at)
                } else {
                    previous_change
                },
            },
        );
    }

    /// Close a cycle. `errors` are this cycle's per-target failures; an
    /// empty list clears any previous error.
    pub async fn finish_cycle(&self, at: DateTime<Utc>, errors: &[String]) {
        let mut status = self.inner.write().await;
        status.last_cycle_at = Some(at);
        status.last_error = join_errors(errors);
    }

    /// Record per-target failures of the initialization pass. Leaves the
    /// status initializing.
    pub async fn record_errors(&self, errors: &[String]) {
        self.inner.write().await.last_error = join_errors(errors);
    }

    /// Record a failure that aborted a cycle or the initialization pass.
    pub async fn record_fatal(&self, message: impl Into<String>) {
        self.inner.write().await.last_error = Some(message.into());
    }
}

fn join_errors(errors: &[String]) -> Option<String> {
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_starts_initializing() {
        let reporter = StatusReporter::new();
        let status = reporter.snapshot().await;

        assert!(status.is_initializing());
        assert!(status.targets.is_empty());
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_last_change_survives_unchanged_observations() {
        let reporter = StatusReporter::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);

        reporter.record_observation("https://x.test", 3, true, t0).await;
        reporter.record_observation("https://x.test", 3, false, t1).await;

        let entry = reporter.snapshot().await.targets["https://x.test"].clone();
        assert_eq!(entry.document_count, 3);
        assert_eq!(entry.last_observed_at, t1);
        assert_eq!(entry.last_change_at, Some(t0));
    }

    #[tokio::test]
    async fn test_error_cleared_by_clean_cycle() {
        let reporter = StatusReporter::new();
        let now = Utc::now();

        reporter
            .finish_cycle(now, &["fetch failed for X".to_string()])
            .await;
        assert_eq!(
            reporter.snapshot().await.last_error.as_deref(),
            Some("fetch failed for X")
        );

        reporter.finish_cycle(now, &[]).await;
        let status = reporter.snapshot().await;
        assert!(status.last_error.is_none());
        assert_eq!(status.last_cycle_at, Some(now));
    }

    #[tokio::test]
    async fn test_init_errors_keep_initializing() {
        let reporter = StatusReporter::new();
        reporter
            .record_errors(&["a down".to_string(), "b down".to_string()])
            .await;

        let status = reporter.snapshot().await;
        assert!(status.is_initializing());
        assert_eq!(status.last_error.as_deref(), Some("a down\nb down"));
    }

    #[tokio::test]
    async fn test_fatal_keeps_initializing() {
        let reporter = StatusReporter::new();
        reporter.record_fatal("init exploded").await;

        let status = reporter.snapshot().await;
        assert!(status.is_initializing());
        assert_eq!(status.last_error.as_deref(), Some("init exploded"));
    }
}
