use crate::common::PartitionKey;
use crate::errors::CosmosResult;
use crate::mapping::CosmosEntity;
use crate::operations::CosmosOperations;
use crate::query::{CosmosPageRequest, Page, Sort};
use crate::repository::query::{PartTreeCosmosQuery, ReturnShape};
use serde_json::Value;

/// Typed CRUD and query access to the container of one entity type.
///
/// # Purpose
///
/// `CosmosRepository` is the entry point applications use instead of the
/// operations facade. Every method addresses the container named by the
/// entity's mapping, and entities go through the mapping converter on the
/// way in and out.
///
/// # Characteristics
///
/// - **Partition aware**: writes take the partition key from the mapped
///   partition field; reads and deletes accept an explicit key and fall
///   back to a cross-partition lookup without one
/// - **Derived queries**: [`CosmosRepository::query`] prepares a query from
///   a method name such as `find_by_last_name_order_by_age`
///
/// # Relationship to Related Types
///
/// - [`SimpleCosmosRepository`](crate::repository::SimpleCosmosRepository): the implementation
/// - [`CosmosRepositoryFactory`](crate::repository::CosmosRepositoryFactory): creates repositories
/// - [`ReactiveCosmosRepository`](crate::repository::ReactiveCosmosRepository): asynchronous counterpart
pub trait CosmosRepository<T: CosmosEntity>: Send + Sync {
    type Operations: CosmosOperations + Clone;

    fn operations(&self) -> &Self::Operations;

    fn container_name(&self) -> &str;

    /// Inserts or replaces `entity`.
    ///
    /// # Returns
    ///
    /// The entity as stored, including a generated id when `entity` had none.
    fn save(&self, entity: &T) -> CosmosResult<T>;

    fn save_all(&self, entities: &[T]) -> CosmosResult<Vec<T>>;

    /// Looks up an entity by id across all partitions.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no document has this id.
    fn find_by_id(&self, id: Value) -> CosmosResult<Option<T>>;

    /// Point read of `id` within `partition_key`.
    fn find_by_id_with_partition(&self, id: Value, partition_key: PartitionKey) -> CosmosResult<Option<T>>;

    fn exists_by_id(&self, id: Value) -> CosmosResult<bool>;

    fn find_all(&self) -> CosmosResult<Vec<T>>;

    fn find_all_by_partition(&self, partition_key: PartitionKey) -> CosmosResult<Vec<T>>;

    /// Entities whose id is one of `ids`. Unknown ids are skipped.
    fn find_all_by_ids(&self, ids: Vec<Value>) -> CosmosResult<Vec<T>>;

    fn find_all_sorted(&self, sort: Sort) -> CosmosResult<Vec<T>>;

    /// One page of all entities.
    ///
    /// # Arguments
    ///
    /// * `page_request` - page size, sort and the continuation token of the
    ///   previous page, if any
    fn find_all_paged(&self, page_request: CosmosPageRequest) -> CosmosResult<Page<T>>;

    fn count(&self) -> CosmosResult<u64>;

    /// Deletes the entity with `id`, looking up its partition first.
    ///
    /// Fails with `NotFound` when no such entity exists.
    fn delete_by_id(&self, id: Value) -> CosmosResult<()>;

    fn delete_by_id_with_partition(&self, id: Value, partition_key: PartitionKey) -> CosmosResult<()>;

    /// Deletes `entity` using its id and partition key.
    fn delete(&self, entity: &T) -> CosmosResult<()>;

    fn delete_entities(&self, entities: &[T]) -> CosmosResult<()>;

    fn delete_all(&self) -> CosmosResult<()>;

    /// Prepares the derived query named `method_name`.
    fn query(&self, method_name: &str, shape: ReturnShape) -> CosmosResult<PartTreeCosmosQuery<T, Self::Operations>>;
}
