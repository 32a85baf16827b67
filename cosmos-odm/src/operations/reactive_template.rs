use crate::client::ContainerProperties;
use crate::common::PartitionKey;
use crate::errors::CosmosResult;
use crate::mapping::{CosmosEntity, EntityInformation};
use crate::operations::{CosmosOperations, CosmosTemplate};
use crate::query::{DocumentQuery, Page};
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;

/// Asynchronous face of [`CosmosTemplate`].
///
/// Single results are returned as futures and multi-item results as
/// streams. Nothing happens until the future or stream is first polled,
/// and dropping it before then cancels the operation. Streams yield items
/// in the same order as the synchronous operation returns them.
#[derive(Clone)]
pub struct ReactiveCosmosTemplate {
    template: CosmosTemplate,
}

impl ReactiveCosmosTemplate {
    pub fn new(template: CosmosTemplate) -> Self {
        ReactiveCosmosTemplate { template }
    }

    /// The synchronous template doing the work.
    pub fn template(&self) -> &CosmosTemplate {
        &self.template
    }

    pub fn container_name<T: CosmosEntity>(&self) -> String {
        self.template.container_name::<T>()
    }

    pub fn create_container_if_not_exists(
        &self,
        info: &'static EntityInformation,
    ) -> BoxFuture<'static, CosmosResult<ContainerProperties>> {
        self.defer(move |t| t.create_container_if_not_exists(info))
    }

    pub fn delete_container(&self, container: &str) -> BoxFuture<'static, CosmosResult<()>> {
        let container = container.to_string();
        self.defer(move |t| t.delete_container(&container))
    }

    pub fn insert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: T,
        partition_key: Option<PartitionKey>,
    ) -> BoxFuture<'static, CosmosResult<T>> {
        let container = container.to_string();
        self.defer(move |t| t.insert(&container, &entity, partition_key))
    }

    pub fn upsert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: T,
        partition_key: Option<PartitionKey>,
    ) -> BoxFuture<'static, CosmosResult<T>> {
        let container = container.to_string();
        self.defer(move |t| t.upsert_and_return(&container, &entity, partition_key))
    }

    pub fn find_by_id<T: CosmosEntity>(
        &self,
        container: &str,
        id: Value,
        partition_key: Option<PartitionKey>,
    ) -> BoxFuture<'static, CosmosResult<Option<T>>> {
        let container = container.to_string();
        self.defer(move |t| t.find_by_id(&container, id, partition_key))
    }

    pub fn find_all<T: CosmosEntity>(&self, container: &str) -> BoxStream<'static, CosmosResult<T>> {
        let container = container.to_string();
        self.defer_stream(move |t| t.find_all(&container))
    }

    pub fn find_all_by_partition<T: CosmosEntity>(
        &self,
        container: &str,
        partition_key: PartitionKey,
    ) -> BoxStream<'static, CosmosResult<T>> {
        let container = container.to_string();
        self.defer_stream(move |t| t.find_all_by_partition(&container, &partition_key))
    }

    pub fn find<T: CosmosEntity>(
        &self,
        query: DocumentQuery,
        container: &str,
    ) -> BoxStream<'static, CosmosResult<T>> {
        let container = container.to_string();
        self.defer_stream(move |t| t.find(&query, &container))
    }

    pub fn exists<T: CosmosEntity>(
        &self,
        query: DocumentQuery,
        container: &str,
    ) -> BoxFuture<'static, CosmosResult<bool>> {
        let container = container.to_string();
        self.defer(move |t| t.exists::<T>(&query, &container))
    }

    pub fn count(&self, container: &str) -> BoxFuture<'static, CosmosResult<u64>> {
        let container = container.to_string();
        self.defer(move |t| t.count(&container))
    }

    pub fn count_query<T: CosmosEntity>(
        &self,
        query: DocumentQuery,
        container: &str,
    ) -> BoxFuture<'static, CosmosResult<u64>> {
        let container = container.to_string();
        self.defer(move |t| t.count_query::<T>(&query, &container))
    }

    pub fn paginate_query<T: CosmosEntity>(
        &self,
        query: DocumentQuery,
        container: &str,
    ) -> BoxFuture<'static, CosmosResult<Page<T>>> {
        let container = container.to_string();
        self.defer(move |t| t.paginate_query(&query, &container))
    }

    pub fn delete_by_id(
        &self,
        container: &str,
        id: Value,
        partition_key: Option<PartitionKey>,
    ) -> BoxFuture<'static, CosmosResult<()>> {
        let container = container.to_string();
        self.defer(move |t| t.delete_by_id(&container, id, partition_key))
    }

    pub fn delete<T: CosmosEntity>(
        &self,
        query: DocumentQuery,
        container: &str,
    ) -> BoxStream<'static, CosmosResult<T>> {
        let container = container.to_string();
        self.defer_stream(move |t| t.delete(&query, &container))
    }

    pub fn delete_all(&self, container: &str) -> BoxFuture<'static, CosmosResult<()>> {
        let container = container.to_string();
        self.defer(move |t| t.delete_all(&container))
    }

    /// Runs `work` on first poll.
    fn defer<R, F>(&self, work: F) -> BoxFuture<'static, CosmosResult<R>>
    where
        R: Send + 'static,
        F: FnOnce(&CosmosTemplate) -> CosmosResult<R> + Send + 'static,
    {
        let template = self.template.clone();
        future::lazy(move |_| work(&template)).boxed()
    }

    /// Runs `work` on first poll and yields its items one by one. A failure
    /// is yielded as the only item.
    fn defer_stream<T, F>(&self, work: F) -> BoxStream<'static, CosmosResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&CosmosTemplate) -> CosmosResult<Vec<T>> + Send + 'static,
    {
        self.defer(work)
            .into_stream()
            .map(|result| match result {
                Ok(items) => stream::iter(items.into_iter().map(Ok)).left_stream(),
                Err(e) => stream::once(future::ready(Err(e))).right_stream(),
            })
            .flatten()
            .boxed()
    }
}
