//! Store - the document database seam.
//!
//! The repository talks to a managed document store through the
//! `DocumentStore` trait: point CRUD on documents addressed by
//! `collection/id`, plus live queries that push the full matching result
//! set to a listener whenever it changes.
//!
//! ```text
//! ┌──────────────────┐  listen(query, listener)   ┌─────────────────────┐
//! │ StorageRepository│ ─────────────────────────▶ │    DocumentStore    │
//! │                  │ ◀───────────────────────── │ (remote or InMemory)│
//! └──────────────────┘  Ok(snapshot) / Err(fault) └─────────────────────┘
//! ```

mod in_memory;
mod registration;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use in_memory::{InMemoryDocumentStore, StoreOp};
pub use registration::ListenerRegistration;

/// Flat field map of one document.
pub type Fields = Map<String, Value>;

/// Callback receiving every snapshot of a live query.
pub type SnapshotListener = Arc<dyn Fn(Result<Vec<Fields>, StoreError>) + Send + Sync>;

/// Live query: equality on the owner field, optionally ordered ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub owner_field: String,
    pub owner_id: String,
    pub order_by: Option<String>,
}

impl Query {
    pub fn owned_by(owner_field: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            owner_field: owner_field.into(),
            owner_id: owner_id.into(),
            order_by: None,
        }
    }

    pub fn order_by(mut self, field: Option<&str>) -> Self {
        self.order_by = field.map(str::to_string);
        self
    }

    /// Whether a document satisfies the equality filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        matches!(
            fields.get(&self.owner_field),
            Some(Value::String(owner)) if *owner == self.owner_id
        )
    }
}

/// Abstract document storage with live queries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Generate a fresh document id for `collection` without writing.
    fn new_document_id(&self, collection: &str) -> String;

    /// Fetch one document. `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError>;

    /// Write the full document, replacing any previous content.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Merge `fields` into an existing document. Unlisted fields keep their
    /// values. Fails with `NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Register a live query. The listener is called once with the initial
    /// result set and again after every change affecting the collection,
    /// until the returned registration is removed.
    fn listen(
        &self,
        collection: &str,
        query: Query,
        listener: SnapshotListener,
    ) -> Result<ListenerRegistration, StoreError>;
}
