use crate::common::{field_to_path, DEFAULT_REQUEST_UNITS, ID_PROPERTY_NAME};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait that binds a Rust type to a container.
///
/// # Purpose
/// Provides the static mapping table of an entity type: its container,
/// id field, partition key and the storage names of its fields. The table
/// is computed once and shared by every operation on the type.
///
/// # Characteristics
/// - Serialization goes through `serde`, so `#[serde(rename)]` and
///   `#[serde(rename_all)]` decide the storage names
/// - A field named `id` is the id field unless another field is marked
/// - Typically implemented via the `CosmosEntity` derive macro
///
/// # Usage
/// ```ignore
/// #[derive(Serialize, Deserialize, CosmosEntity)]
/// #[serde(rename_all = "camelCase")]
/// #[entity(container = "people", partition_key = "last_name")]
/// pub struct Person {
///     id: String,
///     first_name: String,
///     last_name: String,
/// }
/// ```
pub trait CosmosEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn entity_information() -> &'static EntityInformation;
}

/// One mapped field of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProperty {
    logical_name: String,
    storage_name: String,
    collection: bool,
}

impl EntityProperty {
    pub fn new(logical_name: &str, storage_name: &str, collection: bool) -> Self {
        EntityProperty {
            logical_name: logical_name.to_string(),
            storage_name: storage_name.to_string(),
            collection,
        }
    }

    /// Field name as declared on the Rust type.
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Field name as it appears in the stored document.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Whether the field holds a sequence.
    pub fn is_collection(&self) -> bool {
        self.collection
    }
}

/// Static mapping table of an entity type.
///
/// Built with [`EntityInformation::builder`]; the container name defaults
/// to the type name and the id field defaults to `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInformation {
    type_name: String,
    container_name: String,
    id_field: String,
    numeric_id: bool,
    partition_key_field: Option<String>,
    request_units: u32,
    auto_create_container: bool,
    properties: Vec<EntityProperty>,
}

impl EntityInformation {
    pub fn builder(type_name: &str) -> EntityInformationBuilder {
        EntityInformationBuilder::new(type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Logical name of the id field.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Name under which the serializer writes the id field, before it is
    /// moved to the reserved `id` key.
    pub fn id_serialized_name(&self) -> &str {
        self.property(&self.id_field)
            .map(|p| p.storage_name())
            .unwrap_or(&self.id_field)
    }

    pub fn is_numeric_id(&self) -> bool {
        self.numeric_id
    }

    /// Logical name of the partition key field, if the entity is partitioned.
    pub fn partition_key_field(&self) -> Option<&str> {
        self.partition_key_field.as_deref()
    }

    /// Stored field holding the partition key.
    pub fn partition_key_storage_name(&self) -> Option<String> {
        self.partition_key_field.as_deref().map(|f| self.storage_name(f))
    }

    /// Container partition-key path, e.g. `/lastName`.
    pub fn partition_key_path(&self) -> Option<String> {
        self.partition_key_storage_name().map(|f| field_to_path(&f))
    }

    pub fn request_units(&self) -> u32 {
        self.request_units
    }

    pub fn auto_create_container(&self) -> bool {
        self.auto_create_container
    }

    pub fn properties(&self) -> &[EntityProperty] {
        &self.properties
    }

    pub fn property(&self, logical_name: &str) -> Option<&EntityProperty> {
        self.properties.iter().find(|p| p.logical_name == logical_name)
    }

    /// Whether `name` addresses the id, either by its logical name or as `id`.
    pub fn is_id_field(&self, name: &str) -> bool {
        name == self.id_field || name == ID_PROPERTY_NAME
    }

    /// Maps a logical field name to the name used in stored documents.
    ///
    /// The id field always maps to `id`. Unknown names are returned
    /// unchanged, and so are names that already are storage names.
    pub fn storage_name(&self, name: &str) -> String {
        if self.is_id_field(name) {
            return ID_PROPERTY_NAME.to_string();
        }
        if let Some(property) = self.property(name) {
            return property.storage_name.clone();
        }
        if let Some(property) = self.properties.iter().find(|p| p.storage_name == name) {
            if property.logical_name == self.id_field {
                return ID_PROPERTY_NAME.to_string();
            }
        }
        name.to_string()
    }

    /// Whether the logical field `name` holds a sequence.
    pub fn is_collection_field(&self, name: &str) -> bool {
        self.property(name).is_some_and(|p| p.collection)
    }

    /// Whether `name` is a known logical field.
    pub fn has_field(&self, name: &str) -> bool {
        self.is_id_field(name) || self.property(name).is_some()
    }
}

/// Builder for [`EntityInformation`].
pub struct EntityInformationBuilder {
    type_name: String,
    container_name: Option<String>,
    id_field: String,
    numeric_id: bool,
    partition_key_field: Option<String>,
    request_units: u32,
    auto_create_container: bool,
    properties: Vec<EntityProperty>,
}

impl EntityInformationBuilder {
    fn new(type_name: &str) -> Self {
        EntityInformationBuilder {
            type_name: type_name.to_string(),
            container_name: None,
            id_field: ID_PROPERTY_NAME.to_string(),
            numeric_id: false,
            partition_key_field: None,
            request_units: DEFAULT_REQUEST_UNITS,
            auto_create_container: true,
            properties: Vec::new(),
        }
    }

    pub fn container(mut self, container_name: &str) -> Self {
        self.container_name = Some(container_name.to_string());
        self
    }

    pub fn id_field(mut self, id_field: &str) -> Self {
        self.id_field = id_field.to_string();
        self
    }

    pub fn numeric_id(mut self, numeric_id: bool) -> Self {
        self.numeric_id = numeric_id;
        self
    }

    pub fn partition_key(mut self, field: &str) -> Self {
        self.partition_key_field = Some(field.to_string());
        self
    }

    pub fn request_units(mut self, request_units: u32) -> Self {
        self.request_units = request_units;
        self
    }

    pub fn auto_create_container(mut self, auto_create_container: bool) -> Self {
        self.auto_create_container = auto_create_container;
        self
    }

    pub fn property(mut self, logical_name: &str, storage_name: &str, collection: bool) -> Self {
        self.properties
            .push(EntityProperty::new(logical_name, storage_name, collection));
        self
    }

    pub fn build(self) -> EntityInformation {
        EntityInformation {
            container_name: self.container_name.unwrap_or_else(|| self.type_name.clone()),
            type_name: self.type_name,
            id_field: self.id_field,
            numeric_id: self.numeric_id,
            partition_key_field: self.partition_key_field,
            request_units: self.request_units,
            auto_create_container: self.auto_create_container,
            properties: self.properties,
        }
    }
}
