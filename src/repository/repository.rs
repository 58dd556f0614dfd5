//! Repository - Typed CRUD, query, paging and bulk operations over a record store.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, info};

use super::RepoError;
use crate::config::RepositoryConfig;
use crate::page::{Page, PageRequest, Slice};
use crate::query::{
    field_def, CompiledFilter, CompiledSort, DerivedQuery, Example, Filter, Param, Query, Subject,
};
use crate::record::Record;
use crate::store::{RecordStore, Versioned};
use crate::value::Value;

/// Result of [`Repository::execute`]: a page when the query carries page
/// parameters, otherwise every matching record.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<R> {
    Records(Vec<R>),
    Page(Page<R>),
}

impl<R> QueryResult<R> {
    pub fn is_page(&self) -> bool {
        matches!(self, QueryResult::Page(_))
    }

    /// The records, dropping page counters.
    pub fn into_records(self) -> Vec<R> {
        match self {
            QueryResult::Records(records) => records,
            QueryResult::Page(page) => page.into_content(),
        }
    }
}

/// Result of running a derived query; the variant follows the query's verb.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedOutcome<R> {
    Records(Vec<R>),
    Count(usize),
    Exists(bool),
    Deleted(usize),
}

impl<R> DerivedOutcome<R> {
    pub fn records(self) -> Option<Vec<R>> {
        match self {
            DerivedOutcome::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<usize> {
        match self {
            DerivedOutcome::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn exists(&self) -> Option<bool> {
        match self {
            DerivedOutcome::Exists(b) => Some(*b),
            _ => None,
        }
    }

    pub fn deleted(&self) -> Option<usize> {
        match self {
            DerivedOutcome::Deleted(n) => Some(*n),
            _ => None,
        }
    }
}

/// Typed repository for one record kind over a shared store.
///
/// Every query is compiled against the record's field table before the
/// store is touched, so malformed queries fail with `Validation` and never
/// observe or change stored rows.
#[derive(Clone)]
pub struct Repository<S, R> {
    store: S,
    config: RepositoryConfig,
    _marker: PhantomData<R>,
}

fn window<R>(records: Vec<R>, offset: usize, limit: Option<usize>) -> Vec<R> {
    let rest = records.into_iter().skip(offset);
    match limit {
        Some(limit) => rest.take(limit).collect(),
        None => rest.collect(),
    }
}

fn check_page(request: &PageRequest) -> Result<(), RepoError> {
    if request.size() == 0 {
        return Err(RepoError::Validation("page size must be at least 1".into()));
    }
    Ok(())
}

impl<S: RecordStore, R: Record> Repository<S, R> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, RepositoryConfig::default())
    }

    pub fn with_config(store: S, config: RepositoryConfig) -> Self {
        Self {
            store,
            config,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Build a page request from raw parameters using this repository's paging config.
    pub fn page_request(&self, page: Option<usize>, size: Option<usize>) -> PageRequest {
        PageRequest::from_params(page, size, &self.config.paging)
    }

    fn log_query(&self, operation: &'static str, query: &dyn fmt::Display) {
        if self.config.show_queries {
            info!(collection = R::COLLECTION, operation, %query, "query");
        } else {
            debug!(collection = R::COLLECTION, operation, %query, "query");
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert a record without an identifier, or overwrite the stored row
    /// with the same identifier. Returns the record as persisted.
    pub fn save(&self, record: &R) -> Result<R, RepoError> {
        let saved = self.store.upsert(record)?;
        debug!(
            collection = R::COLLECTION,
            id = ?saved.data.id(),
            version = saved.version,
            "saved record"
        );
        Ok(saved.data)
    }

    pub fn save_all(&self, records: &[R]) -> Result<Vec<R>, RepoError> {
        records.iter().map(|record| self.save(record)).collect()
    }

    /// Overwrite a record only if its stored version is `expected_version`.
    pub fn update_versioned(
        &self,
        record: &R,
        expected_version: u64,
    ) -> Result<Versioned<R>, RepoError> {
        Ok(self.store.update(record, expected_version)?)
    }

    /// Delete a record by its identifier. Unsaved records and missing rows are a no-op.
    pub fn delete(&self, record: &R) -> Result<(), RepoError> {
        match record.id() {
            Some(id) => self.delete_by_id(&id),
            None => Ok(()),
        }
    }

    pub fn delete_by_id(&self, id: &R::Id) -> Result<(), RepoError> {
        let removed = self.store.delete::<R>(id)?;
        debug!(collection = R::COLLECTION, %id, removed, "delete by id");
        Ok(())
    }

    /// Delete every listed identifier. Returns how many rows existed.
    pub fn delete_all_by_id(&self, ids: &[R::Id]) -> Result<usize, RepoError> {
        let ids: HashSet<&R::Id> = ids.iter().collect();
        let removed = self
            .store
            .delete_where::<R>(&|r| r.id().is_some_and(|id| ids.contains(&id)))?;
        Ok(removed)
    }

    pub fn delete_all(&self) -> Result<usize, RepoError> {
        let removed = self.store.delete_where::<R>(&|_| true)?;
        debug!(collection = R::COLLECTION, removed, "deleted all records");
        Ok(removed)
    }

    /// Delete every record matching a filter. Returns how many were removed.
    pub fn delete_by(&self, filter: &Filter) -> Result<usize, RepoError> {
        let compiled = CompiledFilter::compile::<R>(filter)?;
        self.log_query("delete", filter);
        Ok(self.store.delete_where::<R>(&|r| compiled.matches(r))?)
    }

    /// Replace `field` with `transform(current)` on every record matching
    /// `filter`, in one store write. Returns the number of records changed.
    ///
    /// If any transformed value is rejected by the field, nothing is written.
    /// Records already loaded by the caller are not refreshed.
    pub fn bulk_update(
        &self,
        filter: &Filter,
        field: &str,
        transform: impl Fn(&Value) -> Value,
    ) -> Result<usize, RepoError> {
        let def = field_def::<R>(field)?;
        if def.identifier {
            return Err(RepoError::Validation(format!(
                "identifier field {} cannot be bulk updated",
                def.name
            )));
        }
        let compiled = CompiledFilter::compile::<R>(filter)?;
        self.log_query("bulk update", filter);

        let name = def.name;
        let updated = self.store.update_where::<R>(&|r| compiled.matches(r), &|r| {
            let current = r.get_field(name).unwrap_or(Value::Null);
            r.set_field(name, transform(&current))
        })?;

        debug!(collection = R::COLLECTION, field = name, updated, "bulk update");
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Lookups by identifier
    // ------------------------------------------------------------------

    pub fn find_by_id(&self, id: &R::Id) -> Result<Option<R>, RepoError> {
        Ok(self.store.get_record::<R>(id)?.map(Versioned::into_data))
    }

    /// The record together with its stored version, for `update_versioned`.
    pub fn find_versioned_by_id(&self, id: &R::Id) -> Result<Option<Versioned<R>>, RepoError> {
        Ok(self.store.get_record::<R>(id)?)
    }

    /// Like `find_by_id`, but a missing record is `NotFound`.
    pub fn get(&self, id: &R::Id) -> Result<R, RepoError> {
        self.find_by_id(id)?.ok_or_else(|| RepoError::NotFound {
            collection: R::COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    /// Records for the given identifiers in insertion order. Missing ids are skipped.
    pub fn find_all_by_id(&self, ids: &[R::Id]) -> Result<Vec<R>, RepoError> {
        let ids: HashSet<&R::Id> = ids.iter().collect();
        let rows = self
            .store
            .scan::<R>(&|r| r.id().is_some_and(|id| ids.contains(&id)))?;
        Ok(rows.into_iter().map(Versioned::into_data).collect())
    }

    pub fn exists_by_id(&self, id: &R::Id) -> Result<bool, RepoError> {
        Ok(self.store.get_record::<R>(id)?.is_some())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Every record, in insertion order.
    pub fn find_all(&self) -> Result<Vec<R>, RepoError> {
        let rows = self.store.scan::<R>(&|_| true)?;
        Ok(rows.into_iter().map(Versioned::into_data).collect())
    }

    /// Matching records in query order, before any windowing.
    fn select(&self, query: &Query) -> Result<Vec<R>, RepoError> {
        let filter = CompiledFilter::compile::<R>(query.filter())?;
        let sort = CompiledSort::compile::<R>(query.effective_sort())?;
        self.log_query("select", query);

        let rows = self.store.scan::<R>(&|r| filter.matches(r))?;
        Ok(sort.apply(rows.into_iter().map(Versioned::into_data).collect()))
    }

    /// Matching records, ordered and windowed.
    ///
    /// Page parameters on the query select that page's rows; otherwise offset
    /// and limit apply.
    pub fn find_all_by(&self, query: &Query) -> Result<Vec<R>, RepoError> {
        match query.page() {
            Some(request) => {
                check_page(request)?;
                let records = self.select(query)?;
                Ok(window(records, request.offset(), Some(request.size())))
            }
            None => {
                let records = self.select(query)?;
                Ok(window(records, query.offset().unwrap_or(0), query.limit()))
            }
        }
    }

    /// One page of matching records plus the total match count.
    ///
    /// The request's sort wins over the query's when it has one. The query's
    /// offset and limit are ignored.
    pub fn find_page(&self, query: &Query, request: PageRequest) -> Result<Page<R>, RepoError> {
        check_page(&request)?;
        let paged = query.clone().with_page(request.clone());
        let records = self.select(&paged)?;
        let total = records.len();
        let content = window(records, request.offset(), Some(request.size()));

        debug!(
            collection = R::COLLECTION,
            page = request.page(),
            size = request.size(),
            total,
            "fetched page"
        );
        Ok(Page::new(content, request, total))
    }

    /// Like `find_page` without the total; reports only whether a next page exists.
    pub fn find_slice(&self, query: &Query, request: PageRequest) -> Result<Slice<R>, RepoError> {
        check_page(&request)?;
        let paged = query.clone().with_page(request.clone());
        let records = self.select(&paged)?;
        let limit = request.size().saturating_add(1);
        let mut content = window(records, request.offset(), Some(limit));
        let has_next = content.len() > request.size();
        content.truncate(request.size());
        Ok(Slice::new(content, request, has_next))
    }

    /// Run a query, returning a page when it carries page parameters.
    pub fn execute(&self, query: &Query) -> Result<QueryResult<R>, RepoError> {
        match query.page() {
            Some(request) => Ok(QueryResult::Page(self.find_page(query, request.clone())?)),
            None => Ok(QueryResult::Records(self.find_all_by(query)?)),
        }
    }

    /// At most one match. More than one is `NonUniqueResult`.
    pub fn find_one(&self, query: &Query) -> Result<Option<R>, RepoError> {
        let mut records = self.find_all_by(query)?;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            count => Err(RepoError::NonUniqueResult {
                collection: R::COLLECTION.to_string(),
                count,
            }),
        }
    }

    /// The first match under the query's ordering, without a uniqueness check.
    pub fn find_first(&self, query: &Query) -> Result<Option<R>, RepoError> {
        let first = query.clone().with_limit(1);
        Ok(self.find_all_by(&first)?.into_iter().next())
    }

    pub fn count(&self) -> Result<usize, RepoError> {
        Ok(self.store.count::<R>(&|_| true)?)
    }

    pub fn count_by(&self, filter: &Filter) -> Result<usize, RepoError> {
        let compiled = CompiledFilter::compile::<R>(filter)?;
        self.log_query("count", filter);
        Ok(self.store.count::<R>(&|r| compiled.matches(r))?)
    }

    pub fn exists_by(&self, filter: &Filter) -> Result<bool, RepoError> {
        Ok(self.count_by(filter)? > 0)
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    /// Map every matching record through `f`.
    pub fn find_projected<T>(
        &self,
        query: &Query,
        f: impl FnMut(R) -> T,
    ) -> Result<Vec<T>, RepoError> {
        Ok(self.find_all_by(query)?.into_iter().map(f).collect())
    }

    /// One column of the matching records.
    pub fn find_field_values(&self, query: &Query, field: &str) -> Result<Vec<Value>, RepoError> {
        let name = field_def::<R>(field)?.name;
        self.find_projected(query, |r| r.get_field(name).unwrap_or(Value::Null))
    }

    // ------------------------------------------------------------------
    // Query by example
    // ------------------------------------------------------------------

    pub fn find_all_by_example(&self, example: &Example<R>) -> Result<Vec<R>, RepoError> {
        self.find_all_by(&Query::matching(example.to_filter()?))
    }

    pub fn find_one_by_example(&self, example: &Example<R>) -> Result<Option<R>, RepoError> {
        self.find_one(&Query::matching(example.to_filter()?))
    }

    pub fn count_by_example(&self, example: &Example<R>) -> Result<usize, RepoError> {
        self.count_by(&example.to_filter()?)
    }

    pub fn exists_by_example(&self, example: &Example<R>) -> Result<bool, RepoError> {
        self.exists_by(&example.to_filter()?)
    }

    // ------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------

    /// Parse a query method name, bind `params` and run it.
    ///
    /// ```ignore
    /// let outcome = repo.derived("findByUsernameAndAgeGreaterThan", &["memberA".into(), 15.into()])?;
    /// ```
    pub fn derived(&self, name: &str, params: &[Param]) -> Result<DerivedOutcome<R>, RepoError> {
        let derived = DerivedQuery::parse(name)?;
        let query = derived.bind(params)?;
        match derived.subject() {
            Subject::Find => Ok(DerivedOutcome::Records(self.find_all_by(&query)?)),
            Subject::Count => Ok(DerivedOutcome::Count(self.count_by(query.filter())?)),
            Subject::Exists => Ok(DerivedOutcome::Exists(self.exists_by(query.filter())?)),
            Subject::Delete => Ok(DerivedOutcome::Deleted(self.delete_by(query.filter())?)),
        }
    }
}
