//! The external form store seam.
//!
//! The store that actually holds form layouts (with its credentials,
//! transport, and retries) is an external collaborator; the tools only
//! need fetch and persist with the store's revision token. Implementations
//! live outside this crate; tests use an in-memory one.

use async_trait::async_trait;
use serde_json::Value;

/// A failure reported by the external store, propagated to tool callers
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("App not found: {0}")]
    AppNotFound(String),

    #[error("Revision conflict for app {app_id}: expected {expected}, found {actual}")]
    RevisionConflict {
        app_id: String,
        expected: String,
        actual: String,
    },

    #[error("Store rejected the layout: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// A fetched form layout and the revision token to persist against.
#[derive(Debug, Clone)]
pub struct FetchedForm {
    pub layout: Value,
    pub revision: String,
}

/// Fetch/persist access to the external form store.
#[async_trait]
pub trait FormStore: Send + Sync {
    async fn fetch(&self, app_id: &str) -> Result<FetchedForm, StoreError>;

    /// Persist a layout, optionally guarded by a revision token, returning
    /// the new revision.
    async fn persist(
        &self,
        app_id: &str,
        layout: &Value,
        revision: Option<&str>,
    ) -> Result<String, StoreError>;
}
