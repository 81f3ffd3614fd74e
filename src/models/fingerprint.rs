//! Page fingerprint and the persisted baseline map.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest prefix for fingerprints built from a document set.
pub const DOCUMENT_TAG: &str = "PDF:";

/// Digest prefix for fingerprints built from page text.
pub const TEXT_TAG: &str = "TXT:";

/// Baselines keyed by target URL.
///
/// A `BTreeMap` keeps the state file in stable key order.
pub type StateMap = BTreeMap<String, Fingerprint>;

/// Extraction strategy that produced a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintKind {
    DocumentSet,
    Text,
}

impl FingerprintKind {
    fn from_digest(digest: &str) -> Option<Self> {
        if digest.starts_with(DOCUMENT_TAG) {
            Some(FingerprintKind::DocumentSet)
        } else if digest.starts_with(TEXT_TAG) {
            Some(FingerprintKind::Text)
        } else {
            None
        }
    }
}

/// Canonical identity of a page's observed content.
///
/// Two fingerprints are equal when their digests are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredFingerprint")]
pub struct Fingerprint {
    /// Tagged SHA-256 of the canonical representation
    pub digest: String,

    /// Which extraction strategy produced the digest
    pub kind: FingerprintKind,

    /// Sorted, duplicate-free document URLs (empty for `Text`)
    pub documents: Vec<String>,
}

impl Fingerprint {
    /// Build a document-set fingerprint.
    ///
    /// Returns `None` when there are no documents; callers fall back to
    /// [`Fingerprint::from_text`].
    pub fn from_documents<I>(documents: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let documents = canonical_documents(documents);
        if documents.is_empty() {
            return None;
        }

        let digest = format!("{DOCUMENT_TAG}{}", sha256_hex(&documents.join("\n")));
        Some(Self {
            digest,
            kind: FingerprintKind::DocumentSet,
            documents,
        })
    }

    /// Build a text fingerprint from page text.
    ///
    /// Whitespace runs collapse to single spaces and the ends are trimmed
    /// before hashing.
    pub fn from_text(text: &str) -> Self {
        let normalized = normalize_whitespace(text);
        Self {
            digest: format!("{TEXT_TAG}{}", sha256_hex(&normalized)),
            kind: FingerprintKind::Text,
            documents: Vec::new(),
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for Fingerprint {}

/// On-disk record shape. Accepts the older `fp`/`pdfs` field names.
#[derive(Deserialize)]
struct StoredFingerprint {
    #[serde(alias = "fp")]
    digest: String,
    #[serde(default)]
    kind: Option<FingerprintKind>,
    #[serde(default, alias = "pdfs")]
    documents: Vec<String>,
}

impl From<StoredFingerprint> for Fingerprint {
    fn from(stored: StoredFingerprint) -> Self {
        let documents = canonical_documents(stored.documents);
        let kind = stored
            .kind
            .or_else(|| FingerprintKind::from_digest(&stored.digest))
            .unwrap_or(if documents.is_empty() {
                FingerprintKind::Text
            } else {
                FingerprintKind::DocumentSet
            });

        Self {
            digest: stored.digest,
            kind,
            documents,
        }
    }
}

fn canonical_documents<I>(documents: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    documents
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
