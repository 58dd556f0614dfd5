//! Records - Plain Rust structs stored and queried by a repository.
//!
//! ## Example
//!
//! ```ignore
//! use derived_repo::Record;
//!
//! #[derive(Clone, Serialize, Deserialize, Record)]
//! #[record(collection = "members")]
//! struct Member {
//!     #[record(id)]
//!     pub id: Option<u64>,
//!     pub username: String,
//!     pub age: i32,
//!     pub team_id: Option<u64>,
//! }
//! ```

mod error;
mod id;

use serde::{de::DeserializeOwned, Serialize};

use crate::value::{Value, ValueKind};

pub use error::FieldError;
pub use id::Identifier;

/// Description of one queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: ValueKind,
    pub nullable: bool,
    /// Set for the identifier field, which can never be written through `set_field`.
    pub identifier: bool,
}

/// Trait for types that can be stored in a record store.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this record type (e.g., "members", "teams").
    const COLLECTION: &'static str;

    /// Queryable fields, in declaration order.
    const FIELDS: &'static [FieldDef];

    type Id: Identifier;

    /// The identifier, or `None` before the first save.
    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    /// Read a queryable field. `None` if the field does not exist.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Write a queryable field.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError>;

    /// Look up a field definition by name.
    fn field_def(name: &str) -> Option<&'static FieldDef> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }
}
