use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::mapping::CosmosEntity;
use crate::operations::CosmosOperations;
use crate::query::{CosmosPageRequest, DocumentQuery, Page};
use crate::repository::query::{ParameterAccessor, QueryMethod};

/// The strategy picked for one query method invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExecution {
    /// Deletes every match and returns the deleted entities.
    Delete,
    /// Returns the page addressed by the request.
    Paged(CosmosPageRequest),
    /// Reports whether anything matches.
    Exists,
    /// Returns every match in query order.
    MultiEntity,
    /// Returns the only match, if any.
    SingleEntity,
}

impl QueryExecution {
    /// Picks the strategy for `method`. The first matching rule wins:
    /// delete, page, exists, collection, then single.
    pub fn select(
        method: &QueryMethod,
        accessor: &ParameterAccessor,
        is_delete_query: bool,
        is_exists_query: bool,
    ) -> CosmosResult<QueryExecution> {
        if is_delete_query {
            Ok(QueryExecution::Delete)
        } else if method.is_page_query() {
            match accessor.page_request() {
                Some(page_request) => Ok(QueryExecution::Paged(page_request.clone())),
                None => {
                    log::error!("Page query {} called without a page request", method.name());
                    Err(CosmosError::new(
                        &format!("Page query {} called without a page request", method.name()),
                        ErrorKind::InvalidQuery,
                    ))
                }
            }
        } else if is_exists_query {
            Ok(QueryExecution::Exists)
        } else if method.is_collection_query() {
            Ok(QueryExecution::MultiEntity)
        } else {
            Ok(QueryExecution::SingleEntity)
        }
    }

    pub fn execute<T, O>(&self, operations: &O, query: &DocumentQuery, container: &str) -> CosmosResult<QueryResult<T>>
    where
        T: CosmosEntity,
        O: CosmosOperations + ?Sized,
    {
        match self {
            QueryExecution::Delete => operations.delete(query, container).map(QueryResult::Deleted),
            QueryExecution::Paged(page_request) => {
                let query = query.clone().with_page_request(page_request.clone());
                operations.paginate_query(&query, container).map(QueryResult::Page)
            }
            QueryExecution::Exists => operations.exists::<T>(query, container).map(QueryResult::Exists),
            QueryExecution::MultiEntity => operations.find(query, container).map(QueryResult::Entities),
            QueryExecution::SingleEntity => {
                let mut found: Vec<T> = operations.find(query, container)?;
                if found.len() > 1 {
                    log::error!("Expected at most one result, found {}", found.len());
                    return Err(CosmosError::new(
                        &format!("Expected at most one result, found {}", found.len()),
                        ErrorKind::IncorrectResultSize {
                            expected: 1,
                            actual: found.len(),
                        },
                    ));
                }
                Ok(QueryResult::Entity(found.pop()))
            }
        }
    }
}

/// Outcome of a query method, one variant per [`QueryExecution`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    Deleted(Vec<T>),
    Page(Page<T>),
    Exists(bool),
    Entities(Vec<T>),
    Entity(Option<T>),
}

impl<T> QueryResult<T> {
    /// Matched entities of a multi-entity, single-entity or delete result.
    pub fn into_entities(self) -> CosmosResult<Vec<T>> {
        match self {
            QueryResult::Entities(entities) | QueryResult::Deleted(entities) => Ok(entities),
            QueryResult::Entity(entity) => Ok(entity.into_iter().collect()),
            other => Err(mismatch("entities", &other)),
        }
    }

    pub fn into_entity(self) -> CosmosResult<Option<T>> {
        match self {
            QueryResult::Entity(entity) => Ok(entity),
            other => Err(mismatch("a single entity", &other)),
        }
    }

    pub fn into_page(self) -> CosmosResult<Page<T>> {
        match self {
            QueryResult::Page(page) => Ok(page),
            other => Err(mismatch("a page", &other)),
        }
    }

    pub fn into_exists(self) -> CosmosResult<bool> {
        match self {
            QueryResult::Exists(exists) => Ok(exists),
            other => Err(mismatch("an existence flag", &other)),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            QueryResult::Deleted(_) => "Deleted",
            QueryResult::Page(_) => "Page",
            QueryResult::Exists(_) => "Exists",
            QueryResult::Entities(_) => "Entities",
            QueryResult::Entity(_) => "Entity",
        }
    }
}

fn mismatch<T>(wanted: &str, result: &QueryResult<T>) -> CosmosError {
    log::error!("Query returned {} but {} was requested", result.variant_name(), wanted);
    CosmosError::new(
        &format!("Query returned {} but {} was requested", result.variant_name(), wanted),
        ErrorKind::InvalidQuery,
    )
}
