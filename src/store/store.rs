//! RecordStore - Abstract row storage for records.

use super::{StoreError, Versioned};
use crate::record::{FieldError, Record};

/// Abstract storage for records.
///
/// Every method is one atomic unit: writers are serialized and a scan sees a
/// single consistent state of the collection.
pub trait RecordStore: Send + Sync {
    /// Get a record by ID. Returns None if not found.
    fn get_record<R: Record>(&self, id: &R::Id) -> Result<Option<Versioned<R>>, StoreError>;

    /// Upsert a record (insert or overwrite, no version check).
    ///
    /// A record without an identifier gets the next one from the collection's
    /// sequence. The returned data carries the identifier.
    fn upsert<R: Record>(&self, record: &R) -> Result<Versioned<R>, StoreError>;

    /// Insert a new record. Fails with a conflict if it already exists.
    fn insert<R: Record>(&self, record: &R) -> Result<Versioned<R>, StoreError>;

    /// Overwrite an existing record if its stored version equals `expected_version`.
    fn update<R: Record>(
        &self,
        record: &R,
        expected_version: u64,
    ) -> Result<Versioned<R>, StoreError>;

    /// Delete a record by ID. Returns true if it existed.
    fn delete<R: Record>(&self, id: &R::Id) -> Result<bool, StoreError>;

    /// Delete every record matching a predicate. Returns how many were removed.
    fn delete_where<R: Record>(&self, predicate: &dyn Fn(&R) -> bool) -> Result<usize, StoreError>;

    /// Records matching a predicate, in insertion order.
    fn scan<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Vec<Versioned<R>>, StoreError>;

    /// Number of records matching a predicate.
    fn count<R: Record>(&self, predicate: &dyn Fn(&R) -> bool) -> Result<usize, StoreError>;

    /// Apply `update` to every record matching `predicate` in one write.
    ///
    /// All updates are computed before anything is written; if any of them
    /// fails the collection is left untouched. Returns the number of rows written.
    fn update_where<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
        update: &dyn Fn(&mut R) -> Result<(), FieldError>,
    ) -> Result<usize, StoreError>;
}
