mod record;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Record)]
// ============================================================================

/// Derive macro for the `Record` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[record(collection = "members")]
/// struct Member {
///     id: Option<u64>,
///     username: String,
///     age: i32,
///     team_id: Option<u64>,
///     #[record(skip)]
///     notes: Vec<String>,
/// }
/// ```
///
/// - `#[record(collection = "...")]`: collection name. Defaults to the
///   snake_case struct name plus `s`.
/// - The identifier is the field marked `#[record(id)]`, or the field named
///   `id`. It must be an `Option<T>`; `T` becomes `Record::Id`.
/// - Integer, float, `bool` and `String` fields, and `Option`s of them, are
///   queryable. Other types are ignored unless marked `#[record(field)]`, in
///   which case they must implement `FieldValue`.
/// - `#[record(skip)]` hides a field from queries.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
