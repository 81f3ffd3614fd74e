// src/pipeline/scheduler.rs

//! Periodic driver for the cycle runner.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::pipeline::CycleRunner;

/// Runs an initialization pass, then one cycle per interval forever.
pub struct Scheduler {
    runner: Arc<CycleRunner>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(runner: Arc<CycleRunner>, interval: Duration) -> Self {
        Self { runner, interval }
    }

    /// Start the loop on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drive cycles for the lifetime of the process.
    ///
    /// Returns only when the initialization pass aborts; the status surface
    /// then keeps reporting "initializing" together with the error.
    pub async fn run(self) {
        if let Err(e) = self.initialize().await {
            log::error!("[{}] Monitoring not started: {}", e.kind(), e);
            self.runner.status().record_fatal(e.to_string()).await;
            return;
        }
        log::info!(
            "Monitoring {} targets every {}s",
            self.runner.targets().len(),
            self.interval.as_secs()
        );

        loop {
            // Failures are already logged and recorded by the runner.
            let _ = self.runner.run_isolated().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn initialize(&self) -> Result<()> {
        let missing = self.runner.store().missing(self.runner.targets()).await;
        if missing.is_empty() {
            log::info!("Baselines present for all targets, skipping initialization");
            return Ok(());
        }

        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move { runner.initialize().await })
            .await
            .map(|_| ())
            .map_err(|e| AppError::Init(e.to_string()))
    }
}
