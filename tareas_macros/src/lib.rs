mod record;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Record)] derive macro
// ============================================================================

/// Derive macro for the `Record` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[record(collection = "examenes", order_by = "timestamp", draft = ExamDraft)]
/// struct Exam {
///     #[serde(rename = "userId")]
///     #[record(owner)]
///     pub owner_id: String,
///     pub materia: String,
///     #[serde(rename = "documentId")]
///     #[record(id)]
///     pub document_id: String,
/// }
/// ```
///
/// - `collection = "..."` sets the collection name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `order_by = "..."` orders live queries by that store field.
/// - `owner_field = "..."` names the store field holding the owner id
///   (defaults to `"userId"`).
/// - `draft = Type` is required and names the editable form type.
/// - `#[record(id)]` / `#[record(owner)]` mark the Rust fields holding the
///   document id and owner id. They default to `document_id` and `owner_id`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
