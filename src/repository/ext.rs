//! RepositoriesExt - Typed repository access on any cloneable store.

use super::Repository;
use crate::config::RepositoryConfig;
use crate::record::Record;
use crate::store::RecordStore;

/// Extension trait for typed record access on any `RecordStore`.
///
/// The store is cloned into the repository, so stores should share their
/// state (as `InMemoryRecordStore` does through an `Arc`).
pub trait RepositoriesExt: RecordStore + Clone + Sized {
    /// Get a typed repository.
    fn repository<R: Record>(&self) -> Repository<Self, R> {
        Repository::new(self.clone())
    }

    /// Get a typed repository with explicit configuration.
    fn repository_with<R: Record>(&self, config: RepositoryConfig) -> Repository<Self, R> {
        Repository::with_config(self.clone(), config)
    }
}

impl<S: RecordStore + Clone> RepositoriesExt for S {}
