use crate::errors::CosmosResult;
use crate::mapping::CosmosEntity;
use crate::operations::CosmosOperations;
use crate::query::DocumentQuery;
use crate::repository::query::{ParameterAccessor, QueryExecution, QueryMethod, QueryResult};

/// A repository query bound to its method metadata and an operations facade.
///
/// # Purpose
/// Implementors only describe the query: how to build a [`DocumentQuery`]
/// from the invocation arguments, and whether the query deletes or checks
/// existence. [`CosmosQuery::execute`] then picks the [`QueryExecution`]
/// and runs it against the method's container.
pub trait CosmosQuery<T: CosmosEntity> {
    type Operations: CosmosOperations;

    fn query_method(&self) -> &QueryMethod;

    fn operations(&self) -> &Self::Operations;

    /// Builds the query for one invocation.
    fn create_query(&self, accessor: &ParameterAccessor) -> CosmosResult<DocumentQuery>;

    fn is_delete_query(&self) -> bool;

    fn is_exists_query(&self) -> bool;

    fn execute(&self, accessor: &ParameterAccessor) -> CosmosResult<QueryResult<T>> {
        let method = self.query_method();
        let query = self.create_query(accessor)?;
        let execution = QueryExecution::select(method, accessor, self.is_delete_query(), self.is_exists_query())?;
        log::debug!("Executing {} as {:?}", method.name(), execution);
        execution.execute(self.operations(), &query, method.container_name())
    }
}
