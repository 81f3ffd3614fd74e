//! Service layer for the watcher.
//!
//! This module contains the collaborators used by a cycle:
//! - Page retrieval (`PageFetcher`, `HttpFetcher`)
//! - Fingerprinting (`Fingerprinter`)
//! - Alert delivery (`Notifier`, `TelegramNotifier`, `LogNotifier`)

mod fetcher;
mod fingerprinter;
mod notifier;

pub use fetcher::{HttpFetcher, PageFetcher};
pub use fingerprinter::{Fingerprinter, extract_documents};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier, format_alert};
