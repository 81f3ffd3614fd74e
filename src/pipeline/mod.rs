//! Pipeline entry points for watcher operations.
//!
//! - `detect`: compare a fresh fingerprint with the stored baseline
//! - `cycle`: one pass over every target
//! - `scheduler`: initialization pass plus the periodic loop

pub mod cycle;
pub mod detect;
pub mod scheduler;

use std::sync::Arc;

pub use cycle::{CycleReport, CycleRunner, TargetOutcome, TargetReport};
pub use detect::{ChangeDetector, Decision, detect_change};
pub use scheduler::Scheduler;

use crate::error::Result;
use crate::models::Config;
use crate::services::{HttpFetcher, LogNotifier, Notifier, TelegramNotifier};
use crate::status::StatusReporter;
use crate::storage::{LocalStorage, StateStore};
use crate::utils::http::create_async_client;

/// Wire a cycle runner from configuration: HTTP fetcher, notifier,
/// state file and a fresh status reporter.
pub async fn build_runner(config: &Config) -> Result<Arc<CycleRunner>> {
    let client = create_async_client(&config.http)?;
    let fetcher = Arc::new(HttpFetcher::with_client(client.clone()));

    let notifier: Arc<dyn Notifier> = match config.notifier.telegram_credentials() {
        Some((token, _)) => Arc::new(TelegramNotifier::new(
            client,
            config.notifier.api_base.clone(),
            token,
        )),
        None => {
            log::warn!("Telegram token or chat id not configured; alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let storage = Arc::new(LocalStorage::new(&config.storage.state_file));
    let store = Arc::new(StateStore::open(storage).await);

    Ok(Arc::new(CycleRunner::new(
        config,
        fetcher,
        notifier,
        store,
        Arc::new(StatusReporter::new()),
    )))
}
