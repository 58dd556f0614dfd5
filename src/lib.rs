//! Generic repository over typed records: CRUD, derived queries, paging,
//! bulk updates, projections, query by example and auditing.

extern crate self as derived_repo;

#[cfg(feature = "audit")]
mod audit;
mod config;
mod page;
mod query;
mod record;
mod repository;
mod store;
mod value;


#[cfg(feature = "audit")]
pub use audit::{
    AuditFields, Auditable, AuditingRepository, AuditorAware, Clock, FixedAuditor, FixedClock,
    SystemClock,
};
pub use config::{PagingConfig, RepositoryConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use page::{Page, PageRequest, Slice};
pub use query::{
    Condition, Criterion, DerivedQuery, Direction, Example, ExampleMatcher, Filter, Order, Param,
    Query, Sort, StringMatcher, Subject,
};
pub use record::{FieldDef, FieldError, Identifier, Record};
pub use repository::{DerivedOutcome, Joined, QueryResult, RepoError, RepositoriesExt, Repository};
pub use store::{InMemoryRecordStore, RecordStore, StoreError, Versioned};
pub use value::{FieldValue, Value, ValueKind};

// Derive macro, same name as the trait
pub use derived_repo_macros::Record;
