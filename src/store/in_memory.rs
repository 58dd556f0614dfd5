//! InMemoryRecordStore - HashMap-backed record store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use super::{RecordStore, StoreError, Versioned};
use crate::record::{FieldError, Identifier, Record};
use crate::value::{Value, ValueKind};

/// Internal stored representation of a record.
pub(super) struct StoredRecord {
    pub(super) bytes: Vec<u8>,
    pub(super) version: u64,
    /// Insertion position, kept across overwrites.
    pub(super) seq: u64,
}

#[derive(Default)]
pub(super) struct Tables {
    pub(super) rows: HashMap<String, StoredRecord>,
    /// Last identifier handed out per collection.
    pub(super) sequences: HashMap<String, u64>,
    pub(super) next_seq: u64,
}

impl Tables {
    /// Next free identifier. The sequence only advances on success.
    fn allocate_id<R: Record>(&mut self) -> Result<R::Id, StoreError> {
        let mut next = self.sequences.get(R::COLLECTION).copied().unwrap_or(0);
        loop {
            next = next.checked_add(1).ok_or_else(exhausted::<R>)?;
            let id = R::Id::from_sequence(next).ok_or_else(exhausted::<R>)?;
            if !self.rows.contains_key(&make_key(R::COLLECTION, &id)) {
                self.sequences.insert(R::COLLECTION.to_string(), next);
                return Ok(id);
            }
        }
    }

    fn observe_id<R: Record>(&mut self, id: &R::Id) {
        if let Some(n) = id.sequence() {
            let seq = self.sequences.entry(R::COLLECTION.to_string()).or_insert(0);
            if n > *seq {
                *seq = n;
            }
        }
    }

    /// Write a row, bumping its version. Returns the new version.
    fn put(&mut self, key: String, bytes: Vec<u8>) -> u64 {
        match self.rows.get_mut(&key) {
            Some(stored) => {
                stored.bytes = bytes;
                stored.version += 1;
                stored.version
            }
            None => {
                self.next_seq += 1;
                self.rows.insert(
                    key,
                    StoredRecord {
                        bytes,
                        version: 1,
                        seq: self.next_seq,
                    },
                );
                1
            }
        }
    }
}

/// In-memory record store backed by a HashMap.
///
/// Storage key is `"COLLECTION:id"`. Clone-friendly via Arc, so repositories
/// for different record kinds can share one store.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    pub(super) storage: Arc<RwLock<Tables>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    /// Create a new empty record store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Tables::default())),
        }
    }

    pub(super) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }

    pub(super) fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }
}

pub(super) fn make_key(collection: &str, id: &impl std::fmt::Display) -> String {
    format!("{}:{}", collection, id)
}

/// Serialize a row. Anything that would not decode again is rejected here,
/// before it reaches the table.
fn encode<R: Record>(record: &R) -> Result<Vec<u8>, StoreError> {
    for def in R::FIELDS.iter().filter(|def| def.kind == ValueKind::Float) {
        if let Some(Value::Float(v)) = record.get_field(def.name) {
            if !v.is_finite() {
                return Err(StoreError::Field(FieldError::NotFinite {
                    field: def.name.to_string(),
                }));
            }
        }
    }
    let bytes = serde_json::to_vec(record).map_err(|e| StoreError::Serde(e.to_string()))?;
    decode::<R>(&bytes)?;
    Ok(bytes)
}

fn exhausted<R: Record>() -> StoreError {
    StoreError::Storage(format!("identifier sequence exhausted for {}", R::COLLECTION))
}

fn decode<R: Record>(bytes: &[u8]) -> Result<R, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serde(e.to_string()))
}

fn unassigned<R: Record>(expected: u64) -> StoreError {
    StoreError::Conflict {
        collection: R::COLLECTION.to_string(),
        id: "<unassigned>".to_string(),
        expected,
        actual: 0,
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_record<R: Record>(&self, id: &R::Id) -> Result<Option<Versioned<R>>, StoreError> {
        let key = make_key(R::COLLECTION, id);
        let tables = self.read()?;

        match tables.rows.get(&key) {
            Some(stored) => Ok(Some(Versioned {
                data: decode(&stored.bytes)?,
                version: stored.version,
            })),
            None => Ok(None),
        }
    }

    fn upsert<R: Record>(&self, record: &R) -> Result<Versioned<R>, StoreError> {
        let mut record = record.clone();
        let mut tables = self.write()?;

        let id = match record.id() {
            Some(id) => {
                tables.observe_id::<R>(&id);
                id
            }
            None => {
                let id = tables.allocate_id::<R>()?;
                record.set_id(id.clone());
                id
            }
        };

        let bytes = encode(&record)?;
        let version = tables.put(make_key(R::COLLECTION, &id), bytes);
        trace!(collection = R::COLLECTION, %id, version, "upserted record");

        Ok(Versioned {
            data: record,
            version,
        })
    }

    fn insert<R: Record>(&self, record: &R) -> Result<Versioned<R>, StoreError> {
        let mut record = record.clone();
        let mut tables = self.write()?;

        let id = match record.id() {
            Some(id) => {
                let key = make_key(R::COLLECTION, &id);
                if let Some(existing) = tables.rows.get(&key) {
                    return Err(StoreError::Conflict {
                        collection: R::COLLECTION.to_string(),
                        id: id.to_string(),
                        expected: 0,
                        actual: existing.version,
                    });
                }
                tables.observe_id::<R>(&id);
                id
            }
            None => {
                let id = tables.allocate_id::<R>()?;
                record.set_id(id.clone());
                id
            }
        };

        let bytes = encode(&record)?;
        let version = tables.put(make_key(R::COLLECTION, &id), bytes);
        trace!(collection = R::COLLECTION, %id, "inserted record");

        Ok(Versioned {
            data: record,
            version,
        })
    }

    fn update<R: Record>(
        &self,
        record: &R,
        expected_version: u64,
    ) -> Result<Versioned<R>, StoreError> {
        let id = record.id().ok_or_else(|| unassigned::<R>(expected_version))?;
        let key = make_key(R::COLLECTION, &id);
        let bytes = encode(record)?;

        let mut tables = self.write()?;

        let actual_version = tables.rows.get(&key).map(|s| s.version).unwrap_or(0);
        if actual_version != expected_version || actual_version == 0 {
            return Err(StoreError::Conflict {
                collection: R::COLLECTION.to_string(),
                id: id.to_string(),
                expected: expected_version,
                actual: actual_version,
            });
        }

        let version = tables.put(key, bytes);
        trace!(collection = R::COLLECTION, %id, version, "updated record");

        Ok(Versioned {
            data: record.clone(),
            version,
        })
    }

    fn delete<R: Record>(&self, id: &R::Id) -> Result<bool, StoreError> {
        let key = make_key(R::COLLECTION, id);
        let mut tables = self.write()?;

        let removed = tables.rows.remove(&key).is_some();
        trace!(collection = R::COLLECTION, %id, removed, "deleted record");
        Ok(removed)
    }

    fn delete_where<R: Record>(&self, predicate: &dyn Fn(&R) -> bool) -> Result<usize, StoreError> {
        let prefix = format!("{}:", R::COLLECTION);
        let mut tables = self.write()?;

        let mut doomed = Vec::new();
        for (key, stored) in tables.rows.iter() {
            if key.starts_with(&prefix) && predicate(&decode::<R>(&stored.bytes)?) {
                doomed.push(key.clone());
            }
        }

        for key in &doomed {
            tables.rows.remove(key);
        }

        Ok(doomed.len())
    }

    fn scan<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Vec<Versioned<R>>, StoreError> {
        let prefix = format!("{}:", R::COLLECTION);
        let tables = self.read()?;

        let mut results = Vec::new();
        for (key, stored) in tables.rows.iter() {
            if key.starts_with(&prefix) {
                let data: R = decode(&stored.bytes)?;
                if predicate(&data) {
                    results.push((
                        stored.seq,
                        Versioned {
                            data,
                            version: stored.version,
                        },
                    ));
                }
            }
        }
        drop(tables);

        results.sort_by_key(|(seq, _)| *seq);
        Ok(results.into_iter().map(|(_, v)| v).collect())
    }

    fn count<R: Record>(&self, predicate: &dyn Fn(&R) -> bool) -> Result<usize, StoreError> {
        let prefix = format!("{}:", R::COLLECTION);
        let tables = self.read()?;

        let mut count = 0;
        for (key, stored) in tables.rows.iter() {
            if key.starts_with(&prefix) && predicate(&decode::<R>(&stored.bytes)?) {
                count += 1;
            }
        }

        Ok(count)
    }

    fn update_where<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
        update: &dyn Fn(&mut R) -> Result<(), FieldError>,
    ) -> Result<usize, StoreError> {
        let prefix = format!("{}:", R::COLLECTION);
        let mut tables = self.write()?;

        let mut staged = Vec::new();
        for (key, stored) in tables.rows.iter() {
            if !key.starts_with(&prefix) {
                continue;
            }
            let mut record: R = decode(&stored.bytes)?;
            if predicate(&record) {
                update(&mut record)?;
                staged.push((key.clone(), encode(&record)?));
            }
        }

        let written = staged.len();
        for (key, bytes) in staged {
            tables.put(key, bytes);
        }

        trace!(collection = R::COLLECTION, written, "bulk updated records");
        Ok(written)
    }
}
