use crate::common::{Document, PARTITION_KEY_PATH_PREFIX};
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// The value a document is routed by.
///
/// A partition key is a JSON scalar (string, number, boolean or null) taken
/// from the top-level field named by the container's partition-key path.
///
/// # Examples
///
/// ```rust
/// use cosmos_odm::common::PartitionKey;
///
/// let key = PartitionKey::new("Smith");
/// assert_eq!(key.value(), &serde_json::json!("Smith"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionKey {
    value: Value,
}

impl PartitionKey {
    pub fn new<T: Into<Value>>(value: T) -> Self {
        PartitionKey { value: value.into() }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Reads the partition key of `document` for a container partitioned by
    /// `path` (e.g. `/lastName`).
    ///
    /// A missing field yields `Ok(None)`; a non-scalar field is rejected.
    pub fn from_document(document: &Document, path: &str) -> CosmosResult<Option<PartitionKey>> {
        let field = path_to_field(path);
        match document.get(field) {
            None => Ok(None),
            Some(Value::Array(_)) | Some(Value::Object(_)) => {
                log::error!("Partition key field '{}' must hold a scalar value", field);
                Err(CosmosError::new(
                    &format!("Partition key field '{}' must hold a scalar value", field),
                    ErrorKind::InvalidId,
                ))
            }
            Some(value) => Ok(Some(PartitionKey::new(value.clone()))),
        }
    }

    /// Canonical string form used to group documents by key.
    pub(crate) fn canonical(&self) -> String {
        self.value.to_string()
    }
}

impl Display for PartitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        PartitionKey::new(value)
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        PartitionKey::new(value)
    }
}

/// Turns a partition-key path into the top-level field it addresses.
pub fn path_to_field(path: &str) -> &str {
    path.strip_prefix(PARTITION_KEY_PATH_PREFIX).unwrap_or(path)
}

/// Turns a storage field name into a partition-key path.
pub fn field_to_path(field: &str) -> String {
    if field.starts_with(PARTITION_KEY_PATH_PREFIX) {
        field.to_string()
    } else {
        format!("{}{}", PARTITION_KEY_PATH_PREFIX, field)
    }
}
