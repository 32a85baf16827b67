use crate::client::{
    ContainerProperties, DocumentClientRef, FeedOptions, RequestOptions, SqlParameter,
    SqlQuerySpec,
};
use crate::common::{Document, PartitionKey, ID_PROPERTY_NAME, PARAMETER_PREFIX, ROOT_ALIAS};
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::mapping::{CosmosEntity, EntityInformation, MappingCosmosConverter};
use crate::operations::CosmosOperations;
use crate::query::{generate_count_query, generate_query, DocumentQuery, Page};
use serde_json::Value;
use std::sync::Arc;

/// Default implementation of [`CosmosOperations`] over a
/// [`DocumentClient`](crate::client::DocumentClient).
///
/// All clones share the same client and database.
///
/// # Examples
///
/// ```rust
/// use cosmos_odm::client::InMemoryDocumentClient;
/// use cosmos_odm::operations::{CosmosOperations, CosmosTemplate};
/// use std::sync::Arc;
///
/// let template = CosmosTemplate::new(Arc::new(InMemoryDocumentClient::new()), "people_db").unwrap();
/// template
///     .create_container_if_not_exists_with("people", Some("/lastName"), Some(400))
///     .unwrap();
/// assert_eq!(template.count("people").unwrap(), 0);
/// ```
#[derive(Clone)]
pub struct CosmosTemplate {
    inner: Arc<CosmosTemplateInner>,
}

impl CosmosTemplate {
    /// Creates a template bound to `database`, creating the database if
    /// it does not exist.
    pub fn new(client: DocumentClientRef, database: &str) -> CosmosResult<Self> {
        CosmosTemplate::new_with_metrics(client, database, false)
    }

    pub(crate) fn new_with_metrics(
        client: DocumentClientRef,
        database: &str,
        populate_query_metrics: bool,
    ) -> CosmosResult<Self> {
        client.create_database_if_not_exists(database)?;
        Ok(CosmosTemplate {
            inner: Arc::new(CosmosTemplateInner {
                client,
                database: database.to_string(),
                converter: MappingCosmosConverter::new(),
                populate_query_metrics,
            }),
        })
    }

    pub fn database_name(&self) -> &str {
        &self.inner.database
    }

    pub fn client(&self) -> &DocumentClientRef {
        &self.inner.client
    }

    pub fn converter(&self) -> &MappingCosmosConverter {
        &self.inner.converter
    }
}

impl CosmosOperations for CosmosTemplate {
    fn create_container_if_not_exists(&self, info: &EntityInformation) -> CosmosResult<ContainerProperties> {
        self.inner.create_container_if_not_exists(
            info.container_name(),
            info.partition_key_path().as_deref(),
            Some(info.request_units()),
        )
    }

    fn create_container_if_not_exists_with(
        &self,
        container: &str,
        partition_key_path: Option<&str>,
        throughput: Option<u32>,
    ) -> CosmosResult<ContainerProperties> {
        self.inner
            .create_container_if_not_exists(container, partition_key_path, throughput)
    }

    fn delete_container(&self, container: &str) -> CosmosResult<()> {
        log::debug!("Deleting container {}", container);
        self.inner.client.delete_container(&self.inner.database, container)
    }

    fn insert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<T> {
        self.inner.insert(container, entity, partition_key)
    }

    fn upsert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<()> {
        self.inner.upsert(container, entity, partition_key).map(|_| ())
    }

    fn upsert_and_return<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<T> {
        let stored = self.inner.upsert(container, entity, partition_key)?;
        self.inner.converter.read(stored)
    }

    fn find_by_id<T: CosmosEntity, I: Into<Value>>(
        &self,
        container: &str,
        id: I,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<Option<T>> {
        self.inner.find_by_id(container, &id.into(), partition_key)
    }

    fn find_all<T: CosmosEntity>(&self, container: &str) -> CosmosResult<Vec<T>> {
        self.find(&DocumentQuery::all(), container)
    }

    fn find_all_by_partition<T: CosmosEntity>(
        &self,
        container: &str,
        partition_key: &PartitionKey,
    ) -> CosmosResult<Vec<T>> {
        let spec = generate_query(&DocumentQuery::all(), T::entity_information())?;
        let options = FeedOptions {
            partition_key: Some(partition_key.clone()),
            ..self.inner.feed_options()
        };
        let values = self.inner.query_all(container, &spec, options)?;
        self.inner.read_all(values)
    }

    fn find<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<Vec<T>> {
        let spec = generate_query(query, T::entity_information())?;
        let values = self.inner.query_all(container, &spec, self.inner.cross_partition())?;
        self.inner.read_all(values)
    }

    fn exists<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<bool> {
        let probe = query.clone().with_limit(1);
        let spec = generate_query(&probe, T::entity_information())?;
        let values = self.inner.query_all(container, &spec, self.inner.cross_partition())?;
        Ok(!values.is_empty())
    }

    fn count(&self, container: &str) -> CosmosResult<u64> {
        let spec = SqlQuerySpec::new(&format!("SELECT VALUE COUNT(1) FROM ROOT {}", ROOT_ALIAS), vec![]);
        self.inner.count(container, &spec)
    }

    fn count_query<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<u64> {
        let spec = generate_count_query(query, T::entity_information())?;
        self.inner.count(container, &spec)
    }

    fn paginate_query<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<Page<T>> {
        let page_request = match query.page_request() {
            Some(page_request) => page_request.clone(),
            None => {
                log::error!("Paged query on {} has no page request", container);
                return Err(CosmosError::new(
                    &format!("Paged query on {} has no page request", container),
                    ErrorKind::InvalidQuery,
                ));
            }
        };

        let spec = generate_query(query, T::entity_information())?;
        let options = FeedOptions {
            max_item_count: Some(page_request.size()),
            continuation: page_request.continuation().map(|c| c.to_string()),
            ..self.inner.cross_partition()
        };
        let response = self
            .inner
            .client
            .query_documents(&self.inner.database, container, &spec, &options)?;

        let content = self.inner.read_all(response.documents)?;
        Ok(Page::new(content, page_request, response.continuation))
    }

    fn delete_by_id<I: Into<Value>>(
        &self,
        container: &str,
        id: I,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<()> {
        self.inner.delete_by_id(container, &id.into(), partition_key)
    }

    fn delete<T: CosmosEntity>(&self, query: &DocumentQuery, container: &str) -> CosmosResult<Vec<T>> {
        let spec = generate_query(query, T::entity_information())?;
        let values = self.inner.query_all(container, &spec, self.inner.cross_partition())?;
        let deleted = self.inner.delete_documents(container, values)?;
        deleted
            .into_iter()
            .map(|document| self.inner.converter.read(document))
            .collect()
    }

    fn delete_all(&self, container: &str) -> CosmosResult<()> {
        let spec = SqlQuerySpec::new(&format!("SELECT * FROM ROOT {}", ROOT_ALIAS), vec![]);
        let values = self.inner.query_all(container, &spec, self.inner.cross_partition())?;
        let deleted = self.inner.delete_documents(container, values)?;
        log::debug!("Deleted {} documents from {}", deleted.len(), container);
        Ok(())
    }
}

struct CosmosTemplateInner {
    client: DocumentClientRef,
    database: String,
    converter: MappingCosmosConverter,
    populate_query_metrics: bool,
}

impl CosmosTemplateInner {
    fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            populate_query_metrics: self.populate_query_metrics,
            ..FeedOptions::default()
        }
    }

    fn cross_partition(&self) -> FeedOptions {
        FeedOptions {
            enable_cross_partition_query: true,
            ..self.feed_options()
        }
    }

    fn create_container_if_not_exists(
        &self,
        container: &str,
        partition_key_path: Option<&str>,
        throughput: Option<u32>,
    ) -> CosmosResult<ContainerProperties> {
        match self.client.read_container(&self.database, container) {
            Ok(properties) => Ok(properties),
            Err(e) if e.is_not_found() => {
                log::debug!(
                    "Creating container {} with partition key path {:?}",
                    container,
                    partition_key_path
                );
                let properties = ContainerProperties::new(container, partition_key_path, throughput);
                self.client.create_container(&self.database, &properties)
            }
            Err(e) => Err(e),
        }
    }

    fn partition_key_of<T: CosmosEntity>(&self, document: &Document) -> CosmosResult<Option<PartitionKey>> {
        match T::entity_information().partition_key_storage_name() {
            Some(field) => PartitionKey::from_document(document, &field),
            None => Ok(None),
        }
    }

    fn insert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<T> {
        let document = self.converter.write(entity)?;
        let partition_key = match partition_key {
            Some(key) => Some(key),
            None => self.partition_key_of::<T>(&document)?,
        };
        log::debug!("Inserting document {:?} into {}", document.get(ID_PROPERTY_NAME), container);

        let options = RequestOptions::with_partition_key(partition_key);
        let stored = self
            .client
            .create_document(&self.database, container, document, &options)?;
        self.converter.read(stored)
    }

    fn upsert<T: CosmosEntity>(
        &self,
        container: &str,
        entity: &T,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<Document> {
        let document = self.converter.write(entity)?;
        let partition_key = match partition_key {
            Some(key) => Some(key),
            None => self.partition_key_of::<T>(&document)?,
        };
        log::debug!("Upserting document {:?} into {}", document.get(ID_PROPERTY_NAME), container);

        let options = RequestOptions::with_partition_key(partition_key);
        self.client
            .upsert_document(&self.database, container, document, &options)
    }

    fn find_by_id<T: CosmosEntity>(
        &self,
        container: &str,
        id: &Value,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<Option<T>> {
        let id = self.converter.id_to_string(id)?;

        if let Some(partition_key) = partition_key {
            let options = RequestOptions::with_partition_key(Some(partition_key));
            return match self.client.read_document(&self.database, container, &id, &options) {
                Ok(document) => Ok(Some(self.converter.read(document)?)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            };
        }

        let values = self.query_all(container, &id_query(&id), self.cross_partition())?;
        if values.len() > 1 {
            log::warn!(
                "Id {} matches {} documents across partitions of {}, returning the first",
                id,
                values.len(),
                container
            );
        }
        match values.into_iter().next() {
            Some(value) => Ok(Some(self.converter.read_value(value)?)),
            None => Ok(None),
        }
    }

    fn delete_by_id(
        &self,
        container: &str,
        id: &Value,
        partition_key: Option<PartitionKey>,
    ) -> CosmosResult<()> {
        let id = self.converter.id_to_string(id)?;
        log::debug!("Deleting document {} from {}", id, container);

        if partition_key.is_some() {
            let options = RequestOptions::with_partition_key(partition_key);
            return self
                .client
                .delete_document(&self.database, container, &id, &options);
        }

        let values = self.query_all(container, &id_query(&id), self.cross_partition())?;
        if values.is_empty() {
            log::error!("Document {} does not exist in {}", id, container);
            return Err(CosmosError::new(
                &format!("Document {} does not exist in {}", id, container),
                ErrorKind::NotFound,
            ));
        }
        self.delete_documents(container, values).map(|_| ())
    }

    /// Deletes the given query results one by one, routing each delete to
    /// the partition of the document.
    fn delete_documents(&self, container: &str, values: Vec<Value>) -> CosmosResult<Vec<Document>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let properties = self.client.read_container(&self.database, container)?;
        let mut deleted = Vec::with_capacity(values.len());
        for value in values {
            let document = match value {
                Value::Object(document) => document,
                other => {
                    log::error!("Query result {} is not a document", other);
                    return Err(CosmosError::new(
                        &format!("Query result {} is not a document", other),
                        ErrorKind::ObjectMapping,
                    ));
                }
            };
            let id = match document.get(ID_PROPERTY_NAME) {
                Some(id) => self.converter.id_to_string(id)?,
                None => {
                    log::error!("Stored document in {} has no id", container);
                    return Err(CosmosError::new(
                        &format!("Stored document in {} has no id", container),
                        ErrorKind::InvalidId,
                    ));
                }
            };
            let partition_key = match &properties.partition_key_path {
                Some(path) => PartitionKey::from_document(&document, path)?,
                None => None,
            };

            let options = RequestOptions::with_partition_key(partition_key);
            self.client
                .delete_document(&self.database, container, &id, &options)?;
            deleted.push(document);
        }
        Ok(deleted)
    }

    /// Drains every page of `spec`.
    fn query_all(&self, container: &str, spec: &SqlQuerySpec, mut options: FeedOptions) -> CosmosResult<Vec<Value>> {
        let mut values = Vec::new();
        loop {
            let response = self
                .client
                .query_documents(&self.database, container, spec, &options)?;
            values.extend(response.documents);
            match response.continuation {
                Some(token) => options.continuation = Some(token),
                None => return Ok(values),
            }
        }
    }

    fn read_all<T: CosmosEntity>(&self, values: Vec<Value>) -> CosmosResult<Vec<T>> {
        values
            .into_iter()
            .map(|value| self.converter.read_value(value))
            .collect()
    }

    fn count(&self, container: &str, spec: &SqlQuerySpec) -> CosmosResult<u64> {
        let values = self.query_all(container, spec, self.cross_partition())?;
        match values.first().and_then(Value::as_u64) {
            Some(count) => Ok(count),
            None => {
                log::error!("Count query on {} returned {:?}", container, values);
                Err(CosmosError::new(
                    &format!("Count query on {} returned no number", container),
                    ErrorKind::InternalError,
                ))
            }
        }
    }
}

fn id_query(id: &str) -> SqlQuerySpec {
    let parameter = format!("{}0", PARAMETER_PREFIX);
    SqlQuerySpec::new(
        &format!("SELECT * FROM ROOT {} WHERE {}.{} = {}", ROOT_ALIAS, ROOT_ALIAS, ID_PROPERTY_NAME, parameter),
        vec![SqlParameter::new(&parameter, id)],
    )
}
