use crate::common::PartitionKey;
use crate::errors::CosmosResult;
use crate::mapping::CosmosEntity;
use crate::operations::ReactiveCosmosTemplate;
use crate::query::{CosmosPageRequest, DocumentQuery, Page, Sort};
use crate::repository::query::{CosmosQuery, ParameterAccessor, PartTreeCosmosQuery, QueryMethod, QueryResult, ReturnShape};
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::BoxStream;
use futures::TryFutureExt;
use serde_json::Value;
use std::marker::PhantomData;

/// Asynchronous repository over a [`ReactiveCosmosTemplate`].
///
/// Mirrors [`CosmosRepository`](crate::repository::CosmosRepository):
/// single results are futures, multi-item results are streams, and nothing
/// runs until first poll.
pub struct ReactiveCosmosRepository<T> {
    template: ReactiveCosmosTemplate,
    container: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CosmosEntity> ReactiveCosmosRepository<T> {
    pub fn new(template: ReactiveCosmosTemplate) -> Self {
        let container = template.container_name::<T>();
        ReactiveCosmosRepository {
            template,
            container,
            _entity: PhantomData,
        }
    }

    pub fn container_name(&self) -> &str {
        &self.container
    }

    pub fn save(&self, entity: T) -> BoxFuture<'static, CosmosResult<T>> {
        self.template.upsert(&self.container, entity, None)
    }

    pub fn find_by_id(&self, id: Value) -> BoxFuture<'static, CosmosResult<Option<T>>> {
        self.template.find_by_id(&self.container, id, None)
    }

    pub fn find_by_id_with_partition(
        &self,
        id: Value,
        partition_key: PartitionKey,
    ) -> BoxFuture<'static, CosmosResult<Option<T>>> {
        self.template.find_by_id(&self.container, id, Some(partition_key))
    }

    pub fn exists_by_id(&self, id: Value) -> BoxFuture<'static, CosmosResult<bool>> {
        self.find_by_id(id).map_ok(|found| found.is_some()).boxed()
    }

    pub fn find_all(&self) -> BoxStream<'static, CosmosResult<T>> {
        self.template.find_all(&self.container)
    }

    pub fn find_all_by_partition(&self, partition_key: PartitionKey) -> BoxStream<'static, CosmosResult<T>> {
        self.template.find_all_by_partition(&self.container, partition_key)
    }

    pub fn find_all_sorted(&self, sort: Sort) -> BoxStream<'static, CosmosResult<T>> {
        self.template
            .find(DocumentQuery::all().with_sort(sort), &self.container)
    }

    pub fn find_all_paged(&self, page_request: CosmosPageRequest) -> BoxFuture<'static, CosmosResult<Page<T>>> {
        let query = DocumentQuery::all().with_page_request(page_request);
        self.template.paginate_query(query, &self.container)
    }

    pub fn count(&self) -> BoxFuture<'static, CosmosResult<u64>> {
        self.template.count(&self.container)
    }

    pub fn delete_by_id(&self, id: Value) -> BoxFuture<'static, CosmosResult<()>> {
        self.template.delete_by_id(&self.container, id, None)
    }

    pub fn delete_by_id_with_partition(
        &self,
        id: Value,
        partition_key: PartitionKey,
    ) -> BoxFuture<'static, CosmosResult<()>> {
        self.template
            .delete_by_id(&self.container, id, Some(partition_key))
    }

    pub fn delete_all(&self) -> BoxFuture<'static, CosmosResult<()>> {
        self.template.delete_all(&self.container)
    }

    /// Runs the derived query named `method_name` on first poll.
    pub fn query(
        &self,
        method_name: &str,
        shape: ReturnShape,
        accessor: ParameterAccessor,
    ) -> BoxFuture<'static, CosmosResult<QueryResult<T>>> {
        let method = QueryMethod::of::<T>(method_name, shape);
        let template = self.template.template().clone();
        future::lazy(move |_| {
            let query: PartTreeCosmosQuery<T, _> = PartTreeCosmosQuery::new(method, template)?;
            query.execute(&accessor)
        })
        .boxed()
    }
}

impl<T> Clone for ReactiveCosmosRepository<T> {
    fn clone(&self) -> Self {
        ReactiveCosmosRepository {
            template: self.template.clone(),
            container: self.container.clone(),
            _entity: PhantomData,
        }
    }
}
