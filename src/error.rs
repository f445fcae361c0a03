//! Errors - store failures and the faults surfaced to callers.

use std::fmt;

use thiserror::Error;

/// Failure reported by a document store or decoding one of its documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store rejected the caller's credentials.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// A document could not be (de)serialized.
    #[error("document serialization error: {0}")]
    Serde(String),
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// Single-shot operations a repository performs against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Add,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Get => "get",
            Operation::Add => "add",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Faults surfaced to callers as values, never as panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// A live query failed to deliver a snapshot.
    #[error("subscription to {collection} failed: {source}")]
    Subscription {
        collection: String,
        #[source]
        source: StoreError,
    },
    /// A single get/add/update/delete failed.
    #[error("{operation} on {collection} failed: {source}")]
    Operation {
        operation: Operation,
        collection: String,
        #[source]
        source: StoreError,
    },
    /// No authenticated user where one is required.
    #[error("{0}")]
    Auth(String),
}

pub(crate) const NOT_AUTHENTICATED: &str = "not authenticated";

impl Fault {
    pub fn subscription(collection: impl Into<String>, source: StoreError) -> Self {
        Fault::Subscription {
            collection: collection.into(),
            source,
        }
    }

    pub fn operation(
        operation: Operation,
        collection: impl Into<String>,
        source: StoreError,
    ) -> Self {
        Fault::Operation {
            operation,
            collection: collection.into(),
            source,
        }
    }

    pub fn not_authenticated() -> Self {
        Fault::Auth(NOT_AUTHENTICATED.to_string())
    }

    /// The store-level cause, if the fault came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Fault::Subscription { source, .. } | Fault::Operation { source, .. } => Some(source),
            Fault::Auth(_) => None,
        }
    }
}
