use crate::mapping::{CosmosEntity, EntityInformation};
use crate::query::{CosmosPageRequest, Sort};
use serde_json::Value;

/// What a query method hands back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// At most one entity.
    Single,
    /// Every match.
    Collection,
    /// One page of matches.
    Page,
}

/// Static description of a repository query method.
#[derive(Debug, Clone)]
pub struct QueryMethod {
    name: String,
    return_shape: ReturnShape,
    entity: &'static EntityInformation,
}

impl QueryMethod {
    pub fn new(name: &str, return_shape: ReturnShape, entity: &'static EntityInformation) -> Self {
        QueryMethod {
            name: name.to_string(),
            return_shape,
            entity,
        }
    }

    /// Describes a method of the repository of `T`.
    pub fn of<T: CosmosEntity>(name: &str, return_shape: ReturnShape) -> Self {
        QueryMethod::new(name, return_shape, T::entity_information())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_shape(&self) -> ReturnShape {
        self.return_shape
    }

    pub fn entity_information(&self) -> &'static EntityInformation {
        self.entity
    }

    pub fn container_name(&self) -> &str {
        self.entity.container_name()
    }

    pub fn is_page_query(&self) -> bool {
        self.return_shape == ReturnShape::Page
    }

    pub fn is_collection_query(&self) -> bool {
        self.return_shape == ReturnShape::Collection
    }
}

/// Arguments of one query method invocation.
///
/// Positional values bind to the method's predicate parts in order. The
/// page request and sort are the special paging and ordering arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterAccessor {
    values: Vec<Value>,
    page_request: Option<CosmosPageRequest>,
    sort: Option<Sort>,
}

impl ParameterAccessor {
    pub fn new(values: Vec<Value>) -> Self {
        ParameterAccessor {
            values,
            page_request: None,
            sort: None,
        }
    }

    pub fn with_page_request(mut self, page_request: CosmosPageRequest) -> Self {
        self.page_request = Some(page_request);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn page_request(&self) -> Option<&CosmosPageRequest> {
        self.page_request.as_ref()
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }
}

/// Builds a [`ParameterAccessor`] from a list of values of mixed types.
///
/// ```rust
/// use cosmos_odm::params;
///
/// let accessor = params!["Smith", 30];
/// assert_eq!(accessor.values().len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::repository::query::ParameterAccessor::default()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::repository::query::ParameterAccessor::new(vec![$($crate::common::JsonValue::from($value)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::OnceLock;

    fn info() -> &'static EntityInformation {
        static INFO: OnceLock<EntityInformation> = OnceLock::new();
        INFO.get_or_init(|| EntityInformation::builder("Person").container("people").build())
    }

    #[test]
    fn test_query_method_shapes() {
        let method = QueryMethod::new("find_by_last_name", ReturnShape::Page, info());
        assert!(method.is_page_query());
        assert!(!method.is_collection_query());
        assert_eq!(method.container_name(), "people");
    }

    #[test]
    fn test_params_macro() {
        let accessor = crate::params!["a", 1, true];
        assert_eq!(accessor.values(), &[json!("a"), json!(1), json!(true)]);
        assert_eq!(accessor.value(3), None);
        assert!(crate::params![].values().is_empty());
    }
}
