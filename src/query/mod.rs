//! Queries - Declarative filter, ordering and windowing of record scans.
//!
//! A query is a plain value. It is validated against the record's field table
//! when executed, before the store is touched.
//!
//! ## Example
//!
//! ```ignore
//! use derived_repo::{Filter, Query, Sort};
//!
//! let query = Query::matching(Filter::new().equal("username", "member").gt("age", 15))
//!     .with_sort(Sort::desc("age"))
//!     .with_limit(10);
//! let members = repo.find_all_by(&query)?;
//! ```

mod compile;
mod criteria;
mod derived;
mod example;
mod sort;

use std::fmt;

use crate::page::PageRequest;

pub(crate) use compile::{field_def, CompiledFilter, CompiledSort};
pub use criteria::{Condition, Criterion, Filter};
pub use derived::{DerivedQuery, Param, Subject};
pub use example::{Example, ExampleMatcher, StringMatcher};
pub use sort::{Direction, Order, Sort};

/// Filter + ordering + optional offset/limit or page parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Filter,
    sort: Sort,
    offset: Option<usize>,
    limit: Option<usize>,
    page: Option<PageRequest>,
}

impl Query {
    /// A query matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matching(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Skip this many rows of the ordered result.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Return at most this many rows.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attach page parameters; `Repository::execute` then returns a page.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn page(&self) -> Option<&PageRequest> {
        self.page.as_ref()
    }

    /// The ordering to apply: a page's own sort wins when it has one.
    pub(crate) fn effective_sort(&self) -> &Sort {
        match &self.page {
            Some(page) if !page.sort().is_unsorted() => page.sort(),
            _ => &self.sort,
        }
    }
}

impl From<Filter> for Query {
    fn from(filter: Filter) -> Self {
        Query::matching(filter)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "where {}", self.filter)?;
        let sort = self.effective_sort();
        if !sort.is_unsorted() {
            write!(f, " order by {}", sort)?;
        }
        if let Some(page) = &self.page {
            write!(f, " page {} size {}", page.page(), page.size())?;
        }
        if let Some(offset) = self.offset {
            write!(f, " offset {}", offset)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}
