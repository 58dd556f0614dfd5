//! Fetch joins - Resolve foreign identifier fields in one batched lookup.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{RepoError, Repository};
use crate::query::field_def;
use crate::record::{Identifier, Record};
use crate::store::RecordStore;
use crate::value::{FieldValue, Value};

/// A record paired with the record its foreign key points at.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<R, A> {
    pub record: R,
    /// `None` when the foreign key is null or dangling.
    pub associated: Option<A>,
}

impl<R, A> Joined<R, A> {
    /// Project the pair, e.g. into a flat DTO.
    pub fn map<T>(self, f: impl FnOnce(R, Option<A>) -> T) -> T {
        f(self.record, self.associated)
    }
}

impl<S: RecordStore, R: Record> Repository<S, R> {
    /// Attach the associated record named by `foreign_key` to each record.
    ///
    /// All distinct foreign identifiers are resolved with a single
    /// `find_all_by_id` on `other`.
    pub fn fetch_join<S2: RecordStore, A: Record>(
        &self,
        records: Vec<R>,
        foreign_key: &str,
        other: &Repository<S2, A>,
    ) -> Result<Vec<Joined<R, A>>, RepoError> {
        let def = field_def::<R>(foreign_key)?;
        let id_kind = <A::Id as FieldValue>::KIND;
        if !def.kind.is_compatible(id_kind) {
            return Err(RepoError::Validation(format!(
                "{} field {} cannot reference {} identifiers of {}",
                def.kind,
                def.name,
                id_kind,
                A::COLLECTION
            )));
        }

        let keys: Vec<Option<A::Id>> = records
            .iter()
            .map(|r| A::Id::from_field(r.get_field(def.name).unwrap_or(Value::Null)))
            .collect();

        let mut seen = HashSet::new();
        let distinct: Vec<A::Id> = keys
            .iter()
            .flatten()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();

        let associated: HashMap<A::Id, A> = other
            .find_all_by_id(&distinct)?
            .into_iter()
            .filter_map(|a| a.id().map(|id| (id, a)))
            .collect();

        debug!(
            collection = R::COLLECTION,
            target = A::COLLECTION,
            rows = records.len(),
            resolved = associated.len(),
            "fetch join"
        );

        Ok(records
            .into_iter()
            .zip(keys)
            .map(|(record, key)| Joined {
                record,
                associated: key.and_then(|id| associated.get(&id).cloned()),
            })
            .collect())
    }
}
