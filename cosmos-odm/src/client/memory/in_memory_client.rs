use super::sql;
use crate::client::{
    ContainerProperties, DatabaseProperties, DocumentClient, FeedOptions, FeedResponse,
    RequestOptions, SqlQuerySpec,
};
use crate::common::{
    path_to_field, Document, PartitionKey, ID_PROPERTY_NAME, SYSTEM_ETAG, SYSTEM_RID,
    SYSTEM_SELF, SYSTEM_TIMESTAMP,
};
use crate::cosmos_config::{ConnectionPolicy, ConsistencyLevel, CosmosConfig};
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Key of the partition that holds documents without a partition key value.
const NONE_PARTITION: &str = "";

/// Document client that keeps every database in process memory.
///
/// # Purpose
/// `InMemoryDocumentClient` implements the full [`DocumentClient`] contract
/// without a network: containers, partitioning, conflict detection, point
/// reads and native SQL queries with continuation tokens. It is the backend
/// used by tests and local development.
///
/// # Characteristics
/// - **Thread-Safe**: clones share the same databases
/// - **Partitioned**: documents are keyed by `(partition key, id)`
/// - **Ordered**: unsorted queries return documents in insertion order
/// - **Pass-Through Settings**: the connection policy and consistency level
///   are recorded but do not change behavior
#[derive(Clone, Default)]
pub struct InMemoryDocumentClient {
    inner: Arc<InMemoryClientInner>,
}

impl InMemoryDocumentClient {
    pub fn new() -> Self {
        InMemoryDocumentClient::default()
    }

    /// Creates a client carrying the transport settings of `config`.
    pub fn from_config(config: &CosmosConfig) -> Self {
        InMemoryDocumentClient {
            inner: Arc::new(InMemoryClientInner {
                connection_policy: config.connection_policy().clone(),
                consistency_level: config.consistency_level(),
                databases: DashMap::new(),
            }),
        }
    }

    pub fn connection_policy(&self) -> &ConnectionPolicy {
        &self.inner.connection_policy
    }

    pub fn consistency_level(&self) -> ConsistencyLevel {
        self.inner.consistency_level
    }
}

impl DocumentClient for InMemoryDocumentClient {
    fn create_database_if_not_exists(&self, database: &str) -> CosmosResult<DatabaseProperties> {
        self.inner.create_database_if_not_exists(database)
    }

    fn delete_database(&self, database: &str) -> CosmosResult<()> {
        self.inner.delete_database(database)
    }

    fn read_container(&self, database: &str, container: &str) -> CosmosResult<ContainerProperties> {
        Ok(self.inner.container(database, container)?.properties.clone())
    }

    fn create_container(
        &self,
        database: &str,
        properties: &ContainerProperties,
    ) -> CosmosResult<ContainerProperties> {
        self.inner.create_container(database, properties)
    }

    fn delete_container(&self, database: &str, container: &str) -> CosmosResult<()> {
        self.inner.delete_container(database, container)
    }

    fn create_document(
        &self,
        database: &str,
        container: &str,
        document: Document,
        options: &RequestOptions,
    ) -> CosmosResult<Document> {
        let container_ref = self.inner.container(database, container)?;
        container_ref.write(database, document, options, false)
    }

    fn upsert_document(
        &self,
        database: &str,
        container: &str,
        document: Document,
        options: &RequestOptions,
    ) -> CosmosResult<Document> {
        let container_ref = self.inner.container(database, container)?;
        container_ref.write(database, document, options, true)
    }

    fn read_document(
        &self,
        database: &str,
        container: &str,
        id: &str,
        options: &RequestOptions,
    ) -> CosmosResult<Document> {
        let container_ref = self.inner.container(database, container)?;
        let key = (container_ref.partition_of_request(options), id.to_string());
        let found = container_ref.documents.read().get(&key).cloned();
        match found {
            Some(document) => Ok(document),
            None => Err(document_not_found(container, id)),
        }
    }

    fn delete_document(
        &self,
        database: &str,
        container: &str,
        id: &str,
        options: &RequestOptions,
    ) -> CosmosResult<()> {
        let container_ref = self.inner.container(database, container)?;
        let key = (container_ref.partition_of_request(options), id.to_string());
        let removed = container_ref.documents.write().shift_remove(&key);
        match removed {
            Some(_) => Ok(()),
            None => Err(document_not_found(container, id)),
        }
    }

    fn query_documents(
        &self,
        database: &str,
        container: &str,
        query: &SqlQuerySpec,
        options: &FeedOptions,
    ) -> CosmosResult<FeedResponse> {
        let container_ref = self.inner.container(database, container)?;
        container_ref.query(query, options)
    }
}

#[derive(Default)]
struct InMemoryClientInner {
    connection_policy: ConnectionPolicy,
    consistency_level: ConsistencyLevel,
    databases: DashMap<String, DashMap<String, Arc<MemoryContainer>>>,
}

impl InMemoryClientInner {
    fn create_database_if_not_exists(&self, database: &str) -> CosmosResult<DatabaseProperties> {
        if database.trim().is_empty() {
            log::error!("Database name cannot be empty");
            return Err(CosmosError::new(
                "Database name cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.databases.entry(database.to_string()).or_insert_with(|| {
            log::debug!("Created database {}", database);
            DashMap::new()
        });
        Ok(DatabaseProperties {
            id: database.to_string(),
        })
    }

    fn delete_database(&self, database: &str) -> CosmosResult<()> {
        match self.databases.remove(database) {
            Some(_) => Ok(()),
            None => {
                log::error!("Database {} does not exist", database);
                Err(CosmosError::new(
                    &format!("Database {} does not exist", database),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    fn create_container(
        &self,
        database: &str,
        properties: &ContainerProperties,
    ) -> CosmosResult<ContainerProperties> {
        let containers = self.databases.get(database).ok_or_else(|| database_not_found(database))?;
        if containers.contains_key(&properties.id) {
            log::error!("Container {} already exists in {}", properties.id, database);
            return Err(CosmosError::new(
                &format!("Container {} already exists in {}", properties.id, database),
                ErrorKind::Conflict,
            ));
        }

        let container = MemoryContainer {
            properties: properties.clone(),
            documents: RwLock::new(IndexMap::new()),
        };
        containers.insert(properties.id.clone(), Arc::new(container));
        log::debug!(
            "Created container {} in {} with partition key path {:?}",
            properties.id,
            database,
            properties.partition_key_path
        );
        Ok(properties.clone())
    }

    fn delete_container(&self, database: &str, container: &str) -> CosmosResult<()> {
        let containers = self.databases.get(database).ok_or_else(|| database_not_found(database))?;
        match containers.remove(container) {
            Some(_) => Ok(()),
            None => Err(container_not_found(database, container)),
        }
    }

    fn container(&self, database: &str, container: &str) -> CosmosResult<Arc<MemoryContainer>> {
        let containers = self.databases.get(database).ok_or_else(|| database_not_found(database))?;
        let result = containers
            .get(container)
            .map(|c| c.value().clone())
            .ok_or_else(|| container_not_found(database, container));
        result
    }
}

type DocumentKey = (String, String);

struct MemoryContainer {
    properties: ContainerProperties,
    documents: RwLock<IndexMap<DocumentKey, Document>>,
}

impl MemoryContainer {
    fn partition_path(&self) -> Option<&str> {
        self.properties.partition_key_path.as_deref()
    }

    fn partition_of_request(&self, options: &RequestOptions) -> String {
        match (self.partition_path(), &options.partition_key) {
            (Some(_), Some(key)) => key.canonical(),
            _ => NONE_PARTITION.to_string(),
        }
    }

    fn partition_of_document(&self, document: &Document) -> CosmosResult<String> {
        match self.partition_path() {
            None => Ok(NONE_PARTITION.to_string()),
            Some(path) => Ok(PartitionKey::from_document(document, path)?
                .map(|key| key.canonical())
                .unwrap_or_else(|| NONE_PARTITION.to_string())),
        }
    }

    fn write(
        &self,
        database: &str,
        mut document: Document,
        options: &RequestOptions,
        upsert: bool,
    ) -> CosmosResult<Document> {
        let id = match document.get(ID_PROPERTY_NAME) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => {
                log::error!("Document must carry a non-empty string id");
                return Err(CosmosError::new(
                    "Document must carry a non-empty string id",
                    ErrorKind::InvalidId,
                ));
            }
        };

        let partition = self.partition_of_document(&document)?;
        if let (Some(path), Some(requested)) = (self.partition_path(), &options.partition_key) {
            if requested.canonical() != partition {
                log::error!(
                    "Partition key {} does not match the value of {} in document {}",
                    requested,
                    path_to_field(path),
                    id
                );
                return Err(CosmosError::new(
                    &format!(
                        "Partition key {} does not match the value of {} in document {}",
                        requested,
                        path_to_field(path),
                        id
                    ),
                    ErrorKind::ClientError,
                ));
            }
        }

        let key = (partition, id.clone());
        let mut documents = self.documents.write();
        if !upsert && documents.contains_key(&key) {
            log::error!("Document with id {} already exists in {}", id, self.properties.id);
            return Err(CosmosError::new(
                &format!("Document with id {} already exists in {}", id, self.properties.id),
                ErrorKind::Conflict,
            ));
        }

        let rid = match documents.get(&key).and_then(|d| d.get(SYSTEM_RID)) {
            Some(rid) => rid.clone(),
            None => Value::String(uuid::Uuid::new_v4().simple().to_string()),
        };
        document.insert(SYSTEM_RID.to_string(), rid);
        document.insert(
            SYSTEM_SELF.to_string(),
            Value::String(format!("dbs/{}/colls/{}/docs/{}", database, self.properties.id, id)),
        );
        document.insert(
            SYSTEM_ETAG.to_string(),
            Value::String(format!("\"{}\"", uuid::Uuid::new_v4())),
        );
        document.insert(
            SYSTEM_TIMESTAMP.to_string(),
            Value::from(chrono::Utc::now().timestamp()),
        );

        documents.insert(key, document.clone());
        Ok(document)
    }

    fn query(&self, query: &SqlQuerySpec, options: &FeedOptions) -> CosmosResult<FeedResponse> {
        let scope = match (self.partition_path(), &options.partition_key) {
            (Some(_), Some(key)) => Some(key.canonical()),
            (Some(_), None) if !options.enable_cross_partition_query => {
                log::error!(
                    "Query on partitioned container {} needs a partition key or cross partition query",
                    self.properties.id
                );
                return Err(CosmosError::new(
                    &format!(
                        "Query on partitioned container {} needs a partition key or cross partition query",
                        self.properties.id
                    ),
                    ErrorKind::ClientError,
                ));
            }
            _ => None,
        };

        let snapshot: Vec<Value> = self
            .documents
            .read()
            .iter()
            .filter(|((partition, _), _)| scope.as_ref().map_or(true, |s| s == partition))
            .map(|(_, document)| Value::Object(document.clone()))
            .collect();

        if options.populate_query_metrics {
            log::debug!("Query {} scanned {} documents", query, snapshot.len());
        }
        let results = sql::run(query, snapshot)?;

        let offset = match &options.continuation {
            Some(token) => token.parse::<usize>().map_err(|_| {
                log::error!("Invalid continuation token {}", token);
                CosmosError::new(
                    &format!("Invalid continuation token {}", token),
                    ErrorKind::InvalidQuery,
                )
            })?,
            None => 0,
        };
        let end = match options.max_item_count {
            Some(size) if size > 0 => results.len().min(offset.saturating_add(size)),
            _ => results.len(),
        };

        let continuation = if end < results.len() {
            Some(end.to_string())
        } else {
            None
        };
        let documents = if offset < end {
            results[offset..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(FeedResponse {
            documents,
            continuation,
        })
    }
}

fn database_not_found(database: &str) -> CosmosError {
    log::error!("Database {} does not exist", database);
    CosmosError::new(
        &format!("Database {} does not exist", database),
        ErrorKind::NotFound,
    )
}

fn container_not_found(database: &str, container: &str) -> CosmosError {
    log::error!("Container {} does not exist in {}", container, database);
    CosmosError::new(
        &format!("Container {} does not exist in {}", container, database),
        ErrorKind::NotFound,
    )
}

fn document_not_found(container: &str, id: &str) -> CosmosError {
    log::error!("Document {} does not exist in {}", id, container);
    CosmosError::new(
        &format!("Document {} does not exist in {}", id, container),
        ErrorKind::NotFound,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SqlParameter;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn client_with_container(partition_key_path: Option<&str>) -> InMemoryDocumentClient {
        let client = InMemoryDocumentClient::new();
        client.create_database_if_not_exists("db").unwrap();
        client
            .create_container("db", &ContainerProperties::new("people", partition_key_path, Some(400)))
            .unwrap();
        client
    }

    #[test]
    fn test_create_then_read() {
        let client = client_with_container(None);
        let stored = client
            .create_document("db", "people", document(json!({"id": "p1", "name": "A"})), &RequestOptions::default())
            .unwrap();
        assert!(stored.contains_key(SYSTEM_TIMESTAMP));
        assert!(stored.contains_key(SYSTEM_ETAG));

        let read = client.read_document("db", "people", "p1", &RequestOptions::default()).unwrap();
        assert_eq!(read.get("name"), Some(&json!("A")));
    }

    #[test]
    fn test_duplicate_create_conflicts() {
        let client = client_with_container(None);
        let doc = document(json!({"id": "p1"}));
        client.create_document("db", "people", doc.clone(), &RequestOptions::default()).unwrap();
        let err = client
            .create_document("db", "people", doc, &RequestOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Conflict);
    }

    #[test]
    fn test_delete_then_read_is_not_found() {
        let client = client_with_container(None);
        client
            .create_document("db", "people", document(json!({"id": "p1"})), &RequestOptions::default())
            .unwrap();
        client.delete_document("db", "people", "p1", &RequestOptions::default()).unwrap();

        let read = client
            .read_document("db", "people", "p1", &RequestOptions::default())
            .unwrap_err();
        assert!(read.is_not_found());
        let delete = client
            .delete_document("db", "people", "p1", &RequestOptions::default())
            .unwrap_err();
        assert!(delete.is_not_found());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let client = client_with_container(None);
        client.upsert_document("db", "people", document(json!({"id": "a", "v": 1})), &RequestOptions::default()).unwrap();
        client.upsert_document("db", "people", document(json!({"id": "b", "v": 1})), &RequestOptions::default()).unwrap();
        client.upsert_document("db", "people", document(json!({"id": "a", "v": 2})), &RequestOptions::default()).unwrap();

        let spec = SqlQuerySpec::new("SELECT * FROM ROOT r", vec![]);
        let response = client.query_documents("db", "people", &spec, &FeedOptions::default()).unwrap();
        assert_eq!(response.documents.len(), 2);
        assert_eq!(response.documents[0]["v"], json!(2));
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let client = client_with_container(None);
        let err = client
            .create_document("db", "people", document(json!({"name": "x"})), &RequestOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn test_partitioned_point_operations() {
        let client = client_with_container(Some("/lastName"));
        let options = RequestOptions::with_partition_key(Some(PartitionKey::new("Smith")));
        client
            .create_document("db", "people", document(json!({"id": "p1", "lastName": "Smith"})), &options)
            .unwrap();
        client
            .create_document("db", "people", document(json!({"id": "p1", "lastName": "Jones"})), &RequestOptions::default())
            .unwrap();

        assert!(client.read_document("db", "people", "p1", &options).is_ok());
        let miss = client
            .read_document("db", "people", "p1", &RequestOptions::default())
            .unwrap_err();
        assert!(miss.is_not_found());

        client.delete_document("db", "people", "p1", &options).unwrap();
        let jones = RequestOptions::with_partition_key(Some(PartitionKey::new("Jones")));
        assert!(client.read_document("db", "people", "p1", &jones).is_ok());
    }

    #[test]
    fn test_mismatched_partition_key_is_rejected() {
        let client = client_with_container(Some("/lastName"));
        let options = RequestOptions::with_partition_key(Some(PartitionKey::new("Jones")));
        let err = client
            .create_document("db", "people", document(json!({"id": "p1", "lastName": "Smith"})), &options)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ClientError);
    }

    #[test]
    fn test_cross_partition_query_must_be_enabled() {
        let client = client_with_container(Some("/lastName"));
        let spec = SqlQuerySpec::new("SELECT * FROM ROOT r", vec![]);
        let err = client
            .query_documents("db", "people", &spec, &FeedOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ClientError);
        assert!(client
            .query_documents("db", "people", &spec, &FeedOptions::cross_partition())
            .is_ok());
    }

    #[test]
    fn test_partition_scoped_query() {
        let client = client_with_container(Some("/lastName"));
        for (id, last) in [("1", "Smith"), ("2", "Smith"), ("3", "Jones")] {
            client
                .create_document("db", "people", document(json!({"id": id, "lastName": last})), &RequestOptions::default())
                .unwrap();
        }
        let spec = SqlQuerySpec::new("SELECT * FROM ROOT r", vec![]);
        let options = FeedOptions {
            partition_key: Some(PartitionKey::new("Smith")),
            ..FeedOptions::default()
        };
        let response = client.query_documents("db", "people", &spec, &options).unwrap();
        assert_eq!(response.documents.len(), 2);
    }

    #[test]
    fn test_paging_with_continuation() {
        let client = client_with_container(None);
        for i in 0..5 {
            client
                .create_document("db", "people", document(json!({"id": i.to_string(), "n": i})), &RequestOptions::default())
                .unwrap();
        }
        let spec = SqlQuerySpec::new(
            "SELECT * FROM ROOT r WHERE r.n >= @param0 ORDER BY r.n DESC",
            vec![SqlParameter::new("@param0", 0)],
        );

        let mut options = FeedOptions {
            max_item_count: Some(2),
            ..FeedOptions::default()
        };
        let mut seen = Vec::new();
        loop {
            let response = client.query_documents("db", "people", &spec, &options).unwrap();
            seen.extend(response.documents.iter().map(|d| d["n"].clone()));
            match response.continuation {
                Some(token) => options.continuation = Some(token),
                None => break,
            }
        }
        assert_eq!(seen, vec![json!(4), json!(3), json!(2), json!(1), json!(0)]);
    }

    #[test]
    fn test_bad_continuation_token() {
        let client = client_with_container(None);
        let spec = SqlQuerySpec::new("SELECT * FROM ROOT r", vec![]);
        let options = FeedOptions {
            continuation: Some("abc".to_string()),
            ..FeedOptions::default()
        };
        let err = client.query_documents("db", "people", &spec, &options).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
    }

    #[test]
    fn test_container_lifecycle() {
        let client = client_with_container(Some("/lastName"));
        let props = client.read_container("db", "people").unwrap();
        assert_eq!(props.partition_key_path.as_deref(), Some("/lastName"));

        let dup = client
            .create_container("db", &ContainerProperties::new("people", None, None))
            .unwrap_err();
        assert_eq!(dup.kind(), &ErrorKind::Conflict);

        client.delete_container("db", "people").unwrap();
        assert!(client.read_container("db", "people").unwrap_err().is_not_found());
        assert!(client.read_container("nope", "people").unwrap_err().is_not_found());
    }

    #[test]
    fn test_from_config_passes_settings_through() {
        let config = CosmosConfig::builder()
            .uri("memory://")
            .key("k")
            .database("db")
            .consistency_level(ConsistencyLevel::Eventual)
            .build()
            .unwrap();
        let client = InMemoryDocumentClient::from_config(&config);
        assert_eq!(client.consistency_level(), ConsistencyLevel::Eventual);
        assert_eq!(client.connection_policy(), config.connection_policy());
    }
}
