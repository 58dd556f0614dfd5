//! Integration tests for the member repository.

#[path = "../support/mod.rs"]
mod support;

mod auditing;
mod bulk;
mod concurrency;
mod crud;
mod example;
mod projections;
mod queries;
mod scores;

use derived_repo::{InMemoryRecordStore, RepositoriesExt};
use support::member_repository::{MemberRepository, Teams};

/// A fresh store with member and team repositories over it.
fn setup() -> (MemberRepository, Teams) {
    support::logging::init();
    let store = InMemoryRecordStore::new();
    (MemberRepository::new(&store), store.repository())
}
