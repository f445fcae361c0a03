//! Records - typed documents owned by a user.
//!
//! A `Record` maps one Rust struct onto one store collection. Its `Draft`
//! is the editable form a detail screen works on.
//!
//! ## Example
//!
//! ```ignore
//! use tareas::{Record, Draft};
//!
//! #[derive(Serialize, Deserialize, Clone, Record)]
//! #[record(collection = "compras", order_by = "producto", draft = PurchaseDraft)]
//! struct Purchase {
//!     #[serde(rename = "userId")]
//!     pub owner_id: String,
//!     pub producto: String,
//!     #[serde(rename = "documentId")]
//!     pub document_id: String,
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;
use crate::store::Fields;

pub use tareas_macros::Record;

/// Trait for types stored as user-owned documents.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Default collection name (e.g. "examenes"). Can be overridden per
    /// deployment through `CollectionNames`.
    const COLLECTION: &'static str;

    /// Store field holding the owner's user id.
    const OWNER_FIELD: &'static str;

    /// Store field live queries are ordered by, if any.
    const ORDER_BY: Option<&'static str>;

    /// Editable form for this record type.
    type Draft: Draft<Record = Self>;

    /// Client-generated identifier, stable for the record's lifetime.
    fn document_id(&self) -> &str;

    /// Id of the user who created the record.
    fn owner_id(&self) -> &str;

    /// Serialize into the flat field map the store persists.
    fn to_fields(&self) -> Result<Fields, StoreError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(fields),
            other => Err(StoreError::Serde(format!(
                "{} must serialize to an object, got {other}",
                Self::COLLECTION
            ))),
        }
    }

    fn from_fields(fields: Fields) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
    }
}

/// Identity assigned to a record at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub owner_id: String,
    pub document_id: String,
    pub created_at: DateTime<Utc>,
}

/// Editable snapshot of a record's user-facing fields.
pub trait Draft: Clone + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    type Record: Record<Draft = Self>;

    /// Populate the form from an existing record.
    fn from_record(record: &Self::Record) -> Self;

    /// Whether every required field is non-blank. Gates submit.
    fn is_complete(&self) -> bool;

    /// Build the full document written on create.
    fn into_record(self, identity: NewRecord) -> Self::Record;

    /// Partial field map written on update. Never includes the owner,
    /// the document id or the creation time.
    fn to_fields(&self) -> Fields;
}

/// True when every value has non-whitespace content.
pub fn all_filled(values: &[&str]) -> bool {
    values.iter().all(|value| !value.trim().is_empty())
}
