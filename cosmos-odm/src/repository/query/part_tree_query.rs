use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::mapping::CosmosEntity;
use crate::operations::CosmosOperations;
use crate::query::{DocumentQuery, Sort};
use crate::repository::query::{CosmosQuery, ParameterAccessor, PartTree, QueryMethod};
use std::marker::PhantomData;

/// Query derived from the name of its method, e.g. `find_by_last_name`.
pub struct PartTreeCosmosQuery<T, O> {
    method: QueryMethod,
    tree: PartTree,
    operations: O,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CosmosEntity, O: CosmosOperations> PartTreeCosmosQuery<T, O> {
    pub fn new(method: QueryMethod, operations: O) -> CosmosResult<Self> {
        if method.entity_information().type_name() != T::entity_information().type_name() {
            log::error!(
                "Query method {} describes {} but the repository holds {}",
                method.name(),
                method.entity_information().type_name(),
                T::entity_information().type_name()
            );
            return Err(CosmosError::new(
                &format!(
                    "Query method {} describes {} but the repository holds {}",
                    method.name(),
                    method.entity_information().type_name(),
                    T::entity_information().type_name()
                ),
                ErrorKind::InvalidQuery,
            ));
        }

        let tree = PartTree::parse(method.name(), method.entity_information())?;
        Ok(PartTreeCosmosQuery {
            method,
            tree,
            operations,
            _entity: PhantomData,
        })
    }

    pub fn tree(&self) -> &PartTree {
        &self.tree
    }
}

impl<T: CosmosEntity, O: CosmosOperations> CosmosQuery<T> for PartTreeCosmosQuery<T, O> {
    type Operations = O;

    fn query_method(&self) -> &QueryMethod {
        &self.method
    }

    fn operations(&self) -> &O {
        &self.operations
    }

    fn create_query(&self, accessor: &ParameterAccessor) -> CosmosResult<DocumentQuery> {
        let criteria = self.tree.to_criteria(self.method.name(), accessor.values())?;

        // orders from the method name come first
        let mut orders = self.tree.sort().orders().to_vec();
        if let Some(sort) = accessor.sort() {
            orders.extend(sort.orders().iter().cloned());
        }

        let mut query = DocumentQuery::new(criteria);
        if !orders.is_empty() {
            query = query.with_sort(Sort::from_orders(orders));
        }
        if let Some(limit) = self.tree.limit() {
            query = query.with_limit(limit);
        }
        if self.tree.is_exists() {
            query = query.with_limit(1);
        }
        if let Some(page_request) = accessor.page_request() {
            query = query.with_page_request(page_request.clone());
        }
        Ok(query)
    }

    fn is_delete_query(&self) -> bool {
        self.tree.is_delete()
    }

    fn is_exists_query(&self) -> bool {
        self.tree.is_exists()
    }
}
