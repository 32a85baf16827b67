use crate::common::{PartitionKey, ID_PROPERTY_NAME};
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::mapping::{CosmosEntity, MappingCosmosConverter};
use crate::operations::{CosmosOperations, CosmosTemplate};
use crate::query::{CosmosPageRequest, Criteria, DocumentQuery, Page, Sort};
use crate::repository::query::{PartTreeCosmosQuery, QueryMethod, ReturnShape};
use crate::repository::CosmosRepository;
use itertools::Itertools;
use serde_json::Value;
use std::marker::PhantomData;

/// Default [`CosmosRepository`] backed by an operations facade.
pub struct SimpleCosmosRepository<T, O = CosmosTemplate> {
    operations: O,
    container: String,
    converter: MappingCosmosConverter,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CosmosEntity, O: CosmosOperations + Clone> SimpleCosmosRepository<T, O> {
    pub fn new(operations: O) -> Self {
        let container = operations.container_name::<T>();
        SimpleCosmosRepository {
            operations,
            container,
            converter: MappingCosmosConverter::new(),
            _entity: PhantomData,
        }
    }

    /// Stored id and partition key of an existing entity.
    fn identity_of(&self, entity: &T) -> CosmosResult<(Value, Option<PartitionKey>)> {
        let info = T::entity_information();
        let has_id = match serde_json::to_value(entity)?.get(info.id_serialized_name()) {
            None | Some(Value::Null) => false,
            Some(Value::String(id)) => !id.is_empty(),
            Some(_) => true,
        };
        if !has_id {
            log::error!("Entity of {} has no id", self.container);
            return Err(CosmosError::new(
                &format!("Entity of {} has no id", self.container),
                ErrorKind::InvalidId,
            ));
        }

        let document = self.converter.write(entity)?;
        let partition_key = match info.partition_key_storage_name() {
            Some(field) => PartitionKey::from_document(&document, &field)?,
            None => None,
        };
        let id = document.get(ID_PROPERTY_NAME).cloned().unwrap_or(Value::Null);
        Ok((id, partition_key))
    }
}

impl<T, O> CosmosRepository<T> for SimpleCosmosRepository<T, O>
where
    T: CosmosEntity,
    O: CosmosOperations + Clone,
{
    type Operations = O;

    fn operations(&self) -> &O {
        &self.operations
    }

    fn container_name(&self) -> &str {
        &self.container
    }

    fn save(&self, entity: &T) -> CosmosResult<T> {
        self.operations.upsert_and_return(&self.container, entity, None)
    }

    fn save_all(&self, entities: &[T]) -> CosmosResult<Vec<T>> {
        entities.iter().map(|entity| self.save(entity)).collect()
    }

    fn find_by_id(&self, id: Value) -> CosmosResult<Option<T>> {
        self.operations.find_by_id(&self.container, id, None)
    }

    fn find_by_id_with_partition(&self, id: Value, partition_key: PartitionKey) -> CosmosResult<Option<T>> {
        self.operations.find_by_id(&self.container, id, Some(partition_key))
    }

    fn exists_by_id(&self, id: Value) -> CosmosResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    fn find_all(&self) -> CosmosResult<Vec<T>> {
        self.operations.find_all(&self.container)
    }

    fn find_all_by_partition(&self, partition_key: PartitionKey) -> CosmosResult<Vec<T>> {
        self.operations.find_all_by_partition(&self.container, &partition_key)
    }

    fn find_all_by_ids(&self, ids: Vec<Value>) -> CosmosResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids
            .iter()
            .map(|id| self.converter.id_to_string(id))
            .collect::<CosmosResult<Vec<String>>>()?
            .into_iter()
            .unique()
            .collect();
        log::debug!("Finding {} by ids [{}]", self.container, ids.iter().join(", "));

        let query = DocumentQuery::new(Criteria::field(ID_PROPERTY_NAME).is_in(ids));
        self.operations.find(&query, &self.container)
    }

    fn find_all_sorted(&self, sort: Sort) -> CosmosResult<Vec<T>> {
        self.operations
            .find(&DocumentQuery::all().with_sort(sort), &self.container)
    }

    fn find_all_paged(&self, page_request: CosmosPageRequest) -> CosmosResult<Page<T>> {
        let query = DocumentQuery::all().with_page_request(page_request);
        self.operations.paginate_query(&query, &self.container)
    }

    fn count(&self) -> CosmosResult<u64> {
        self.operations.count(&self.container)
    }

    fn delete_by_id(&self, id: Value) -> CosmosResult<()> {
        self.operations.delete_by_id(&self.container, id, None)
    }

    fn delete_by_id_with_partition(&self, id: Value, partition_key: PartitionKey) -> CosmosResult<()> {
        self.operations
            .delete_by_id(&self.container, id, Some(partition_key))
    }

    fn delete(&self, entity: &T) -> CosmosResult<()> {
        let (id, partition_key) = self.identity_of(entity)?;
        self.operations.delete_by_id(&self.container, id, partition_key)
    }

    fn delete_entities(&self, entities: &[T]) -> CosmosResult<()> {
        entities.iter().try_for_each(|entity| self.delete(entity))
    }

    fn delete_all(&self) -> CosmosResult<()> {
        self.operations.delete_all(&self.container)
    }

    fn query(&self, method_name: &str, shape: ReturnShape) -> CosmosResult<PartTreeCosmosQuery<T, O>> {
        PartTreeCosmosQuery::new(QueryMethod::of::<T>(method_name, shape), self.operations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryDocumentClient;
    use crate::mapping::EntityInformation;
    use crate::params;
    use crate::repository::query::CosmosQuery;
    use serde::{Deserialize, Serialize};
    use std::sync::{Arc, OnceLock};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Address {
        id: Option<String>,
        city: String,
        street: String,
    }

    impl CosmosEntity for Address {
        fn entity_information() -> &'static EntityInformation {
            static INFO: OnceLock<EntityInformation> = OnceLock::new();
            INFO.get_or_init(|| {
                EntityInformation::builder("Address")
                    .partition_key("city")
                    .property("id", "id", false)
                    .property("city", "city", false)
                    .property("street", "street", false)
                    .build()
            })
        }
    }

    fn address(id: &str, city: &str, street: &str) -> Address {
        Address {
            id: Some(id.to_string()),
            city: city.to_string(),
            street: street.to_string(),
        }
    }

    fn repository() -> SimpleCosmosRepository<Address> {
        let template = CosmosTemplate::new(Arc::new(InMemoryDocumentClient::new()), "db").unwrap();
        template
            .create_container_if_not_exists(Address::entity_information())
            .unwrap();
        SimpleCosmosRepository::new(template)
    }

    #[test]
    fn test_save_is_idempotent() {
        let repo = repository();
        let a = address("1", "Oslo", "Main");
        repo.save(&a).unwrap();
        repo.save(&a).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.container_name(), "Address");
    }

    #[test]
    fn test_save_generates_missing_id() {
        let repo = repository();
        let saved = repo
            .save(&Address {
                id: None,
                city: "Oslo".into(),
                street: "Main".into(),
            })
            .unwrap();
        assert!(saved.id.as_deref().is_some_and(|id| !id.is_empty()));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_find_all_by_ids_skips_unknown() {
        let repo = repository();
        repo.save_all(&[address("1", "Oslo", "A"), address("2", "Rome", "B"), address("3", "Oslo", "C")])
            .unwrap();
        let found = repo
            .find_all_by_ids(vec![Value::from("1"), Value::from("3"), Value::from("9"), Value::from("1")])
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(repo.find_all_by_ids(vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_delete_entity_uses_its_partition() {
        let repo = repository();
        repo.save_all(&[address("1", "Oslo", "A"), address("1", "Rome", "B")])
            .unwrap();
        repo.delete(&address("1", "Oslo", "A")).unwrap();

        let left = repo.find_all().unwrap();
        assert_eq!(left, vec![address("1", "Rome", "B")]);
        assert!(repo
            .find_by_id_with_partition(Value::from("1"), PartitionKey::from("Oslo"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_without_id_is_rejected() {
        let repo = repository();
        let err = repo
            .delete(&Address {
                id: None,
                city: "Oslo".into(),
                street: "A".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn test_sorted_and_paged() {
        let repo = repository();
        repo.save_all(&[address("1", "Oslo", "C"), address("2", "Rome", "A"), address("3", "Oslo", "B")])
            .unwrap();
        let streets: Vec<String> = repo
            .find_all_sorted(Sort::by("street"))
            .unwrap()
            .into_iter()
            .map(|a| a.street)
            .collect();
        assert_eq!(streets, vec!["A", "B", "C"]);

        let page = repo.find_all_paged(CosmosPageRequest::first(2).unwrap()).unwrap();
        assert_eq!(page.number_of_elements(), 2);
        let rest = repo.find_all_paged(page.next_pageable().unwrap()).unwrap();
        assert_eq!(rest.number_of_elements(), 1);
        assert!(!rest.has_next());
    }

    #[test]
    fn test_derived_query() {
        let repo = repository();
        repo.save_all(&[address("1", "Oslo", "A"), address("2", "Rome", "B")])
            .unwrap();
        let found = repo
            .query("find_by_city", ReturnShape::Single)
            .unwrap()
            .execute(&params!["Rome"])
            .unwrap()
            .into_entity()
            .unwrap();
        assert_eq!(found, Some(address("2", "Rome", "B")));
    }
}
