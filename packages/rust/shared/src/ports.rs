//! Collaborator ports consumed by the orchestrators.
//!
//! Each external system the pipeline talks to is reached through one of these
//! traits. Concrete adapters live in the `docflow-source`, `docflow-storage`
//! and `docflow-workflow` crates; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ContentMap, Credentials, DocumentEventType, SaveReceipt, TriggerReceipt};

/// Fetches live documents from the upstream content source.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the full page payload for `document_id`.
    async fn get_page(&self, document_id: &str) -> Result<ContentMap>;
}

/// Durable key/value blob storage for JSON payloads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist `content` under `key`. Existing objects are overwritten.
    async fn save(&self, key: &str, content: &ContentMap) -> Result<SaveReceipt>;

    /// Load the JSON object stored at `uri` (as returned by [`ObjectStore::save`]).
    async fn get_document_from_uri(&self, uri: &str) -> Result<ContentMap>;
}

/// Starts the downstream workflow once a raw payload has landed.
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    async fn trigger(
        &self,
        document_id: &str,
        event_type: DocumentEventType,
        document_uri: &str,
    ) -> Result<TriggerReceipt>;
}

/// Resolves named credentials.
///
/// Unlike the other ports this never fails: lookup errors are logged and an
/// empty [`Credentials`] is returned.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Credentials;
}
