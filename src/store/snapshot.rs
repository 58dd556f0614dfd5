//! Binary snapshots of an in-memory store.
//!
//! A snapshot captures every collection, row version, insertion position and
//! identifier sequence, so a restored store continues exactly where the
//! original left off.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::in_memory::{StoredRecord, Tables};
use super::{InMemoryRecordStore, StoreError};

#[derive(Serialize, Deserialize)]
struct SnapshotRow {
    key: String,
    bytes: Vec<u8>,
    version: u64,
    seq: u64,
}

#[derive(Serialize, Deserialize)]
struct StoreSnapshot {
    rows: Vec<SnapshotRow>,
    sequences: Vec<(String, u64)>,
    next_seq: u64,
}

impl InMemoryRecordStore {
    /// Encode the whole store with bitcode.
    pub fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let tables = self.read()?;

        let mut rows: Vec<SnapshotRow> = tables
            .rows
            .iter()
            .map(|(key, stored)| SnapshotRow {
                key: key.clone(),
                bytes: stored.bytes.clone(),
                version: stored.version,
                seq: stored.seq,
            })
            .collect();
        rows.sort_by_key(|row| row.seq);

        let snapshot = StoreSnapshot {
            rows,
            sequences: tables
                .sequences
                .iter()
                .map(|(collection, seq)| (collection.clone(), *seq))
                .collect(),
            next_seq: tables.next_seq,
        };
        drop(tables);

        let bytes =
            bitcode::serialize(&snapshot).map_err(|e| StoreError::Serde(e.to_string()))?;
        debug!(rows = snapshot.rows.len(), bytes = bytes.len(), "store snapshot taken");
        Ok(bytes)
    }

    /// Build a new store from bytes produced by [`InMemoryRecordStore::snapshot`].
    pub fn restore(bytes: &[u8]) -> Result<Self, StoreError> {
        let snapshot: StoreSnapshot =
            bitcode::deserialize(bytes).map_err(|e| StoreError::Serde(e.to_string()))?;

        let mut tables = Tables {
            next_seq: snapshot.next_seq,
            ..Tables::default()
        };
        for row in snapshot.rows {
            tables.rows.insert(
                row.key,
                StoredRecord {
                    bytes: row.bytes,
                    version: row.version,
                    seq: row.seq,
                },
            );
        }
        tables.sequences.extend(snapshot.sequences);

        debug!(rows = tables.rows.len(), "store restored from snapshot");
        Ok(Self {
            storage: Arc::new(RwLock::new(tables)),
        })
    }
}
