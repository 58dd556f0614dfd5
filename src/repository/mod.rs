//! Repository - Generic CRUD and query surface over a record store.
//!
//! ## Example
//!
//! ```ignore
//! use derived_repo::{Filter, InMemoryRecordStore, PageRequest, Query, RepositoriesExt, Sort};
//!
//! let store = InMemoryRecordStore::new();
//! let members = store.repository::<Member>();
//!
//! let saved = members.save(&Member::new("memberA", 10))?;
//! let page = members.find_page(
//!     &Query::matching(Filter::new().equal("age", 10)),
//!     PageRequest::of_sorted(0, 3, Sort::desc("username")),
//! )?;
//! let bumped = members.bulk_update(&Filter::new().ge("age", 30), "age", |age| age.plus(1))?;
//! ```

mod error;
mod ext;
mod join;
mod repository;

pub use error::RepoError;
pub use ext::RepositoriesExt;
pub use join::Joined;
pub use repository::{DerivedOutcome, QueryResult, Repository};
