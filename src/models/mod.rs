// src/models/mod.rs

//! Domain models for the watcher.

mod config;
mod fingerprint;
mod status;

// Re-export all public types
pub use config::{
    Config, HttpConfig, MonitorConfig, NotifierConfig, ServerConfig, StorageConfig,
};
pub use fingerprint::{DOCUMENT_TAG, Fingerprint, FingerprintKind, StateMap, TEXT_TAG};
pub use status::{CycleStatus, TargetStatus};
