//! In-memory status of the most recent cycles.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Process-wide status snapshot served by the status surface.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CycleStatus {
    /// When the last cycle finished (`None` while initializing)
    pub last_cycle_at: Option<DateTime<Utc>>,

    /// Per-target observations keyed by target URL
    pub targets: BTreeMap<String, TargetStatus>,

    /// Most recent failure description, cleared by a fully successful cycle
    pub last_error: Option<String>,
}

impl CycleStatus {
    pub fn is_initializing(&self) -> bool {
        self.last_cycle_at.is_none()
    }
}

/// Last observation of a single target.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TargetStatus {
    /// Number of documents in the last fingerprint
    pub document_count: usize,

    /// When the target was last fetched successfully
    pub last_observed_at: DateTime<Utc>,

    /// When a baseline was last written for the target
    pub last_change_at: Option<DateTime<Utc>>,
}
