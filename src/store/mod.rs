//! Stores - Pluggable backends holding the rows of every record collection.
//!
//! A store only knows how to upsert, fetch, delete and scan rows by key.
//! Filtering, sorting and paging live in the repository layer.
//!
//! ## Example
//!
//! ```ignore
//! use derived_repo::{InMemoryRecordStore, RecordStore};
//!
//! let store = InMemoryRecordStore::new();
//! let saved = store.upsert(&member)?;
//! let loaded = store.get_record::<Member>(&saved.data.id.unwrap())?;
//! ```

mod in_memory;
#[cfg(feature = "snapshot")]
mod snapshot;
mod store;

use std::fmt;

use crate::record::FieldError;

/// A versioned wrapper around record data for optimistic concurrency control.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Error type for record store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Optimistic concurrency conflict. `actual` is 0 when the row is gone.
    Conflict {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    /// A field update was rejected.
    Field(FieldError),
    /// Serialization/deserialization error.
    Serde(String),
    /// Storage-level error.
    Storage(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "concurrency conflict on {}:{} (expected version {}, actual {})",
                collection, id, expected, actual
            ),
            StoreError::Field(err) => write!(f, "field update rejected: {}", err),
            StoreError::Serde(msg) => write!(f, "record serialization error: {}", msg),
            StoreError::Storage(msg) => write!(f, "record storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Field(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FieldError> for StoreError {
    fn from(err: FieldError) -> Self {
        StoreError::Field(err)
    }
}

pub use in_memory::InMemoryRecordStore;
pub use store::RecordStore;
