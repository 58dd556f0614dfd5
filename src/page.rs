//! Paging - Page requests and bounded result windows.

use tracing::warn;

use crate::config::PagingConfig;
use crate::query::Sort;

/// A 0-based page number, a page size and an optional ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    size: usize,
    sort: Sort,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            sort: Sort::unsorted(),
        }
    }

    pub fn of_sorted(page: usize, size: usize, sort: Sort) -> Self {
        Self { page, size, sort }
    }

    /// Translate raw page parameters as a surrounding service receives them.
    ///
    /// A missing or zero size falls back to the configured default and sizes
    /// above the maximum are clamped. One-indexed page numbers are shifted.
    pub fn from_params(page: Option<usize>, size: Option<usize>, config: &PagingConfig) -> Self {
        let size = match size {
            None | Some(0) => config.default_page_size,
            Some(size) if size > config.max_page_size => {
                warn!(
                    requested = size,
                    max = config.max_page_size,
                    "page size clamped to configured maximum"
                );
                config.max_page_size
            }
            Some(size) => size,
        };

        let page = page.unwrap_or(0);
        let page = if config.one_indexed_parameters {
            page.saturating_sub(1)
        } else {
            page
        };

        Self::of(page, size)
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Position of the first row of this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }

    pub fn previous_or_first(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            ..self.clone()
        }
    }

    pub fn first(&self) -> Self {
        Self {
            page: 0,
            ..self.clone()
        }
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    request: PageRequest,
    total: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total: usize) -> Self {
        Self {
            content,
            request,
            total,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// The 0-based page number.
    pub fn number(&self) -> usize {
        self.request.page
    }

    pub fn size(&self) -> usize {
        self.request.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        if self.request.size == 0 {
            0
        } else {
            self.total.div_ceil(self.request.size)
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.request
            .page
            .saturating_add(1)
            .saturating_mul(self.request.size)
            < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.request.page > 0
    }

    pub fn is_first(&self) -> bool {
        self.request.page == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    pub fn next_request(&self) -> Option<PageRequest> {
        self.has_next().then(|| self.request.next())
    }

    /// Map the content, keeping the page counters.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total: self.total,
        }
    }
}

/// A page of results that only knows whether a next page exists.
///
/// Cheaper than [`Page`]: no total count is computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    content: Vec<T>,
    request: PageRequest,
    has_next: bool,
}

impl<T> Slice<T> {
    pub fn new(content: Vec<T>, request: PageRequest, has_next: bool) -> Self {
        Self {
            content,
            request,
            has_next,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> usize {
        self.request.page
    }

    pub fn size(&self) -> usize {
        self.request.size
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn is_first(&self) -> bool {
        self.request.page == 0
    }

    pub fn next_request(&self) -> Option<PageRequest> {
        self.has_next.then(|| self.request.next())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            has_next: self.has_next,
        }
    }
}
