use crate::common::{Document, ID_PROPERTY_NAME, SYSTEM_PROPERTIES};
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::mapping::{CosmosEntity, EntityInformation};
use serde_json::{Number, Value};

/// Converts entities to stored documents and back.
///
/// On write the id field is moved to the reserved `id` key. Numeric ids
/// are stored as strings, and a missing or null id is replaced by a
/// generated UUID. On read the system properties are stripped and `id` is
/// moved back to the id field.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingCosmosConverter;

impl MappingCosmosConverter {
    pub fn new() -> Self {
        MappingCosmosConverter
    }

    /// Serializes `entity` into a document ready to be stored.
    pub fn write<T: CosmosEntity>(&self, entity: &T) -> CosmosResult<Document> {
        let info = T::entity_information();
        let mut document = match serde_json::to_value(entity)? {
            Value::Object(map) => map,
            other => {
                log::error!(
                    "Entity {} must serialize to a JSON object, found {}",
                    info.type_name(),
                    other
                );
                return Err(CosmosError::new(
                    &format!("Entity {} must serialize to a JSON object", info.type_name()),
                    ErrorKind::ObjectMapping,
                ));
            }
        };

        let raw_id = document.remove(info.id_serialized_name());
        let id = match raw_id {
            None | Some(Value::Null) => self.generate_id(info)?,
            Some(Value::String(s)) if s.is_empty() => self.generate_id(info)?,
            Some(value) => self.id_to_string(&value)?,
        };
        document.insert(ID_PROPERTY_NAME.to_string(), Value::String(id));
        Ok(document)
    }

    /// Deserializes a stored document.
    pub fn read<T: CosmosEntity>(&self, mut document: Document) -> CosmosResult<T> {
        let info = T::entity_information();
        for property in SYSTEM_PROPERTIES {
            document.remove(property);
        }

        if let Some(id) = document.remove(ID_PROPERTY_NAME) {
            let id = if info.is_numeric_id() {
                numeric_id(info, id)?
            } else {
                id
            };
            document.insert(info.id_serialized_name().to_string(), id);
        }

        Ok(serde_json::from_value(Value::Object(document))?)
    }

    /// Deserializes a query result, which must be a JSON object.
    pub fn read_value<T: CosmosEntity>(&self, value: Value) -> CosmosResult<T> {
        match value {
            Value::Object(document) => self.read(document),
            other => {
                log::error!("Query result {} is not a document", other);
                Err(CosmosError::new(
                    &format!("Query result {} is not a document", other),
                    ErrorKind::ObjectMapping,
                ))
            }
        }
    }

    /// Renders an id value the way it is stored.
    pub fn id_to_string(&self, id: &Value) -> CosmosResult<String> {
        match id {
            Value::String(s) if !s.is_empty() => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => {
                log::error!("Invalid id value {}", other);
                Err(CosmosError::new(
                    &format!("Invalid id value {}", other),
                    ErrorKind::InvalidId,
                ))
            }
        }
    }

    fn generate_id(&self, info: &EntityInformation) -> CosmosResult<String> {
        if info.is_numeric_id() {
            log::error!("Numeric id of {} must be assigned before saving", info.type_name());
            return Err(CosmosError::new(
                &format!("Numeric id of {} must be assigned before saving", info.type_name()),
                ErrorKind::InvalidId,
            ));
        }
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

fn numeric_id(info: &EntityInformation, id: Value) -> CosmosResult<Value> {
    let text = match &id {
        Value::String(s) => s.as_str(),
        Value::Number(_) => return Ok(id),
        _ => "",
    };
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Number(Number::from(i)));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Value::Number(Number::from(u)));
    }
    if let Some(n) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Ok(Value::Number(n));
    }
    log::error!("Stored id {} of {} is not numeric", id, info.type_name());
    Err(CosmosError::new(
        &format!("Stored id {} of {} is not numeric", id, info.type_name()),
        ErrorKind::ObjectMapping,
    ))
}
