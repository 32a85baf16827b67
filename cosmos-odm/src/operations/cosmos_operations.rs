use crate::client::ContainerProperties;
use crate::common::PartitionKey;
use crate::errors::CosmosResult;
use crate::mapping::{CosmosEntity, EntityInformation};
use crate::query::{DocumentQuery, Page};
use serde_json::Value;

/// Container and document operations on typed entities.
///
/// # Purpose
/// `CosmosOperations` is the facade between repositories and the document
/// client. It converts entities to documents, translates queries to native
/// SQL and routes every call to the right partition.
///
/// # Characteristics
/// - **Typed**: documents are converted with the entity's mapping table
/// - **Partition Aware**: a partition key turns reads and deletes into point
///   operations; without one, lookups run as cross-partition queries
/// - **No Retries**: client failures are returned as they are
pub trait CosmosOperations: Send + Sync {
    /// Container name of `T`.
    fn container_name<T: CosmosEntity>(&self) -> String {
        T::entity_information().container_name().to_string()
    }

    /// Creates the container described by `info` unless it exists.
    fn create_container_if_not_exists(&self, info: &EntityInformation) -> CosmosResult<ContainerProperties>;

    /// Creates a container by name unless it exists.
    ///
    /// # Arguments
    /// * `container` - Container name
    /// * `partition_key_path` - Partition key path such as `/lastName`
    /// * `throughput` - Request units of the container
    fn create_container_if_not_exists_with(
        &self,
        container: &str,
        partition_key_path: Option<&str>,
        throughput: Option<u32>,
    ) -> CosmosResult<ContainerProperties>;

    fn delete_container(&self, container: &str) -> CosmosResult<()>;

    /// Inserts `entity`, failing with `Conflict` when the id is taken.
    ///
    /// Without an explicit `partition_key` the key is read from the
    /// entity's partition key field.
    fn insert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<T>;

    /// Inserts or replaces `entity`.
    fn upsert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<()>;

    /// Inserts or replaces `entity` and returns the stored state, including
    /// a generated id.
    fn upsert_and_return<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<T>;

    /// Reads one entity by id. A missing entity is `Ok(None)`.
    fn find_by_id<T: CosmosEntity, I: Into<Value>>(
        &self,
        container: &str,
        id: I,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<Option<T>>;

    fn find_all<T: CosmosEntity>(&self, container: &str) -> CosmosResult<Vec<T>>;

    fn find_all_by_partition<T: CosmosEntity>(
        &self,
        container: &str,
        partition_key: &PartitionKey,
    ) -> CosmosResult<Vec<T>>;

    fn find<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<Vec<T>>;

    fn exists<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<bool>;

    /// Number of documents in `container`.
    fn count(&self, container: &str) -> CosmosResult<u64>;

    fn count_query<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<u64>;

    /// Runs `query` for the page named by its page request.
    fn paginate_query<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<Page<T>>;

    /// Deletes one document, failing with `NotFound` when it does not exist.
    fn delete_by_id<I: Into<Value>>(
        &self,
        container: &str,
        id: I,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<()>;

    /// Deletes every match of `query` and returns the deleted entities.
    fn delete<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<Vec<T>>;

    /// Deletes every document of `container`.
    fn delete_all(&self, container: &str) -> CosmosResult<()>;
}
