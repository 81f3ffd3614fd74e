//! Change detection between a stored baseline and a fresh fingerprint.
//!
//! The digest alone decides whether a target changed. The document set
//! difference only tells the alert which documents are new.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::Fingerprint;

/// What to do with a freshly computed fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// No baseline yet: store it, stay silent
    FirstObservation,
    /// Digest matches the baseline: nothing to do
    Unchanged,
    /// Digest differs: alert and replace the baseline
    Changed { new_documents: Vec<String> },
}

impl Decision {
    /// Whether the fresh fingerprint must become the stored baseline.
    pub fn writes_baseline(&self) -> bool {
        !matches!(self, Decision::Unchanged)
    }

    /// Whether an alert is warranted.
    pub fn is_change(&self) -> bool {
        matches!(self, Decision::Changed { .. })
    }
}

/// Compares fingerprints of the same target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Decide how `current` relates to the stored `previous` baseline.
    pub fn detect(&self, previous: Option<&Fingerprint>, current: &Fingerprint) -> Decision {
        let Some(previous) = previous else {
            return Decision::FirstObservation;
        };

        if previous.digest == current.digest {
            return Decision::Unchanged;
        }

        // Added: in current but not in previous
        let previous_docs: HashSet<&str> =
            previous.documents.iter().map(String::as_str).collect();
        let new_documents = current
            .documents
            .iter()
            .filter(|doc| !previous_docs.contains(doc.as_str()))
            .cloned()
            .collect();

        Decision::Changed { new_documents }
    }
}

/// Convenience function to run the detector.
pub fn detect_change(previous: Option<&Fingerprint>, current: &Fingerprint) -> Decision {
    ChangeDetector::new().detect(previous, current)
}
