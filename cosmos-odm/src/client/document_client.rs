use crate::client::SqlQuerySpec;
use crate::common::{Document, PartitionKey};
use crate::cosmos_config::ConsistencyLevel;
use crate::errors::CosmosResult;
use std::sync::Arc;

/// Properties of a database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseProperties {
    pub id: String,
}

/// Properties of a container.
///
/// `partition_key_path` is a top-level path such as `/lastName`; `None`
/// creates an unpartitioned container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerProperties {
    pub id: String,
    pub partition_key_path: Option<String>,
    pub throughput: Option<u32>,
}

impl ContainerProperties {
    pub fn new(id: &str, partition_key_path: Option<&str>, throughput: Option<u32>) -> Self {
        ContainerProperties {
            id: id.to_string(),
            partition_key_path: partition_key_path.map(|p| p.to_string()),
            throughput,
        }
    }
}

/// Options of a single-document request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub partition_key: Option<PartitionKey>,
    pub consistency_level: Option<ConsistencyLevel>,
}

impl RequestOptions {
    pub fn with_partition_key(partition_key: Option<PartitionKey>) -> Self {
        RequestOptions {
            partition_key,
            consistency_level: None,
        }
    }
}

/// Options of a query request.
///
/// Queries against a partitioned container without a `partition_key` need
/// `enable_cross_partition_query`. `max_item_count` bounds the size of the
/// returned page; `continuation` resumes a previous query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedOptions {
    pub partition_key: Option<PartitionKey>,
    pub enable_cross_partition_query: bool,
    pub max_item_count: Option<usize>,
    pub continuation: Option<String>,
    pub populate_query_metrics: bool,
}

impl FeedOptions {
    pub fn cross_partition() -> Self {
        FeedOptions {
            enable_cross_partition_query: true,
            ..FeedOptions::default()
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedResponse {
    pub documents: Vec<serde_json::Value>,
    pub continuation: Option<String>,
}

/// The document-database client SDK seam.
///
/// Everything of engineering weight (transport, consistency, partition
/// routing, query execution) lives behind this trait. Errors are reported
/// with the storage kinds of [`ErrorKind`](crate::errors::ErrorKind):
/// `Conflict` for an existing key, `NotFound` for a missing database,
/// container or document.
pub trait DocumentClient: Send + Sync {
    fn create_database_if_not_exists(&self, database: &str) -> CosmosResult<DatabaseProperties>;

    fn delete_database(&self, database: &str) -> CosmosResult<()>;

    fn read_container(&self, database: &str, container: &str) -> CosmosResult<ContainerProperties>;

    fn create_container(
        &self,
        database: &str,
        properties: &ContainerProperties,
    ) -> CosmosResult<ContainerProperties>;

    fn delete_container(&self, database: &str, container: &str) -> CosmosResult<()>;

    fn create_document(
        &self,
        database: &str,
        container: &str,
        document: Document,
        options: &RequestOptions,
    ) -> CosmosResult<Document>;

    fn upsert_document(
        &self,
        database: &str,
        container: &str,
        document: Document,
        options: &RequestOptions,
    ) -> CosmosResult<Document>;

    fn read_document(
        &self,
        database: &str,
        container: &str,
        id: &str,
        options: &RequestOptions,
    ) -> CosmosResult<Document>;

    fn delete_document(
        &self,
        database: &str,
        container: &str,
        id: &str,
        options: &RequestOptions,
    ) -> CosmosResult<()>;

    /// Runs `query` and returns one page of results.
    ///
    /// Documents are returned as JSON values because aggregate queries
    /// (`SELECT VALUE COUNT(1)`) produce scalars.
    fn query_documents(
        &self,
        database: &str,
        container: &str,
        query: &SqlQuerySpec,
        options: &FeedOptions,
    ) -> CosmosResult<FeedResponse>;
}

/// Shared handle to a client implementation.
pub type DocumentClientRef = Arc<dyn DocumentClient>;
