use crate::common::DEFAULT_PAGE_SIZE;
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::query::Sort;

/// Request for one page of results.
///
/// Pages are reached by continuation token, not by offset: the token of
/// page `n` comes from the [`Page`] returned for page `n - 1`. The page
/// index is informational.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CosmosPageRequest {
    page: usize,
    size: usize,
    continuation: Option<String>,
    sort: Sort,
}

impl CosmosPageRequest {
    /// Creates a request; `size` must be positive.
    pub fn new(page: usize, size: usize, continuation: Option<String>) -> CosmosResult<Self> {
        if size == 0 {
            log::error!("Page size must be greater than zero");
            return Err(CosmosError::new(
                "Page size must be greater than zero",
                ErrorKind::InvalidQuery,
            ));
        }
        Ok(CosmosPageRequest {
            page,
            size,
            continuation,
            sort: Sort::unsorted(),
        })
    }

    /// First page of `size` documents.
    pub fn first(size: usize) -> CosmosResult<Self> {
        CosmosPageRequest::new(0, size, None)
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

    pub fn continuation(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Request for the following page, resuming at `continuation`.
    pub fn next(&self, continuation: &str) -> CosmosPageRequest {
        CosmosPageRequest {
            page: self.page + 1,
            size: self.size,
            continuation: Some(continuation.to_string()),
            sort: self.sort.clone(),
        }
    }
}

impl Default for CosmosPageRequest {
    fn default() -> Self {
        CosmosPageRequest {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            continuation: None,
            sort: Sort::unsorted(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    pageable: CosmosPageRequest,
    continuation: Option<String>,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: CosmosPageRequest, continuation: Option<String>) -> Self {
        Page {
            content,
            pageable,
            continuation,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    /// The request this page answers.
    pub fn pageable(&self) -> &CosmosPageRequest {
        &self.pageable
    }

    /// Continuation token of the next page, if there is one.
    pub fn continuation(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.continuation.is_some()
    }

    pub fn next_pageable(&self) -> Option<CosmosPageRequest> {
        self.continuation.as_deref().map(|token| self.pageable.next(token))
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            pageable: self.pageable,
            continuation: self.continuation,
        }
    }
}
