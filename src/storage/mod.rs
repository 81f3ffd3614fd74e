//! Baseline persistence.
//!
//! The durable side is a [`StateStorage`] backend holding one flat JSON
//! document keyed by target URL:
//!
//! ```text
//! {
//!   "https://example.com/page": {
//!     "digest": "PDF:…",
//!     "kind": "document_set",
//!     "documents": ["https://example.com/a.pdf"]
//!   }
//! }
//! ```
//!
//! [`StateStore`] owns the in-memory copy that is authoritative for the
//! lifetime of the process.

pub mod local;
mod state;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::StateMap;

// Re-export for convenience
pub use local::LocalStorage;
pub use state::{Reconciliation, StateStore};

/// Trait for baseline storage backends.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load every stored baseline. A missing store yields an empty map.
    async fn load(&self) -> Result<StateMap>;

    /// Replace the stored baselines with `state`.
    ///
    /// A failed or interrupted save must leave the previous contents intact.
    async fn save(&self, state: &StateMap) -> Result<()>;
}
