//! Translation of criteria trees into native SQL.
//!
//! Every value is bound as a parameter (`@param0`, `@param1`, ...), never
//! inlined into the query text. Field names go through the entity's mapping
//! table first, so the logical id field addresses `r.id` and renamed fields
//! address their stored names. Values compared against the id are bound in
//! their stored string form.

use crate::client::{SqlParameter, SqlQuerySpec};
use crate::common::{PARAMETER_PREFIX, ROOT_ALIAS};
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::mapping::{EntityInformation, MappingCosmosConverter};
use crate::query::{Criteria, CriteriaType, DocumentQuery, Sort};
use serde_json::Value;

/// Builds `SELECT [TOP n] * FROM ROOT r [WHERE ...] [ORDER BY ...]`.
pub fn generate_query(query: &DocumentQuery, info: &EntityInformation) -> CosmosResult<SqlQuerySpec> {
    let mut generator = SqlGenerator::new(info);
    let predicate = generator.criteria(query.criteria())?;

    let mut text = String::from("SELECT ");
    if let Some(limit) = query.limit() {
        text.push_str(&format!("TOP {} ", limit));
    }
    text.push_str(&format!("* FROM ROOT {}", ROOT_ALIAS));
    append_where(&mut text, predicate);
    text.push_str(&generator.order_by(query.sort()));

    let spec = SqlQuerySpec::new(&text, generator.parameters);
    log::debug!("Generated query {}", spec);
    Ok(spec)
}

/// Builds `SELECT VALUE COUNT(1) FROM ROOT r [WHERE ...]`.
pub fn generate_count_query(query: &DocumentQuery, info: &EntityInformation) -> CosmosResult<SqlQuerySpec> {
    let mut generator = SqlGenerator::new(info);
    let predicate = generator.criteria(query.criteria())?;

    let mut text = format!("SELECT VALUE COUNT(1) FROM ROOT {}", ROOT_ALIAS);
    append_where(&mut text, predicate);

    let spec = SqlQuerySpec::new(&text, generator.parameters);
    log::debug!("Generated count query {}", spec);
    Ok(spec)
}

/// Renders a stored field path relative to the root alias, e.g. `r.lastName`
/// or `r["first-name"]`.
pub fn field_path(field: &str, info: &EntityInformation) -> String {
    let mut segments = field.split('.');
    let head = segments.next().unwrap_or(field);

    let mut path = String::from(ROOT_ALIAS);
    push_segment(&mut path, &info.storage_name(head));
    for segment in segments {
        push_segment(&mut path, segment);
    }
    path
}

fn push_segment(path: &mut String, segment: &str) {
    if is_identifier(segment) {
        path.push('.');
        path.push_str(segment);
    } else {
        let escaped = segment.replace('\\', "\\\\").replace('"', "\\\"");
        path.push_str(&format!("[\"{}\"]", escaped));
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Ids are stored as strings, so numeric ids (also inside `In` arrays) are
/// compared in that form.
fn stored_id(value: &Value) -> CosmosResult<Value> {
    match value {
        Value::Number(_) => MappingCosmosConverter::new().id_to_string(value).map(Value::String),
        Value::Array(items) => items
            .iter()
            .map(stored_id)
            .collect::<CosmosResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn append_where(text: &mut String, predicate: Option<Rendered>) {
    if let Some(predicate) = predicate {
        text.push_str(" WHERE ");
        text.push_str(&predicate.text);
    }
}

/// A translated predicate and whether it joins several sub-predicates.
struct Rendered {
    text: String,
    compound: bool,
}

impl Rendered {
    fn simple(text: String) -> Self {
        Rendered {
            text,
            compound: false,
        }
    }
}

struct SqlGenerator<'a> {
    info: &'a EntityInformation,
    parameters: Vec<SqlParameter>,
}

impl<'a> SqlGenerator<'a> {
    fn new(info: &'a EntityInformation) -> Self {
        SqlGenerator {
            info,
            parameters: Vec::new(),
        }
    }

    fn bind(&mut self, value: &Value) -> String {
        let name = format!("{}{}", PARAMETER_PREFIX, self.parameters.len());
        self.parameters.push(SqlParameter::new(&name, value.clone()));
        name
    }

    fn criteria(&mut self, criteria: &Criteria) -> CosmosResult<Option<Rendered>> {
        match criteria.criteria_type() {
            CriteriaType::All => Ok(None),
            CriteriaType::And => self.connective("AND", criteria.sub_criteria()),
            CriteriaType::Or => self.connective("OR", criteria.sub_criteria()),
            _ => self.leaf(criteria).map(|text| Some(Rendered::simple(text))),
        }
    }

    fn connective(&mut self, keyword: &str, children: &[Criteria]) -> CosmosResult<Option<Rendered>> {
        let mut parts = Vec::with_capacity(children.len());
        let mut unfiltered = false;
        for child in children {
            match self.criteria(child)? {
                Some(rendered) if rendered.compound => parts.push(format!("({})", rendered.text)),
                Some(rendered) => parts.push(rendered.text),
                None => unfiltered = true,
            }
        }

        // a branch matching everything makes the whole disjunction match everything
        if unfiltered && keyword == "OR" {
            return Ok(None);
        }

        Ok(match parts.len() {
            0 => None,
            1 => parts.pop().map(Rendered::simple),
            _ => Some(Rendered {
                text: parts.join(&format!(" {} ", keyword)),
                compound: true,
            }),
        })
    }

    fn leaf(&mut self, criteria: &Criteria) -> CosmosResult<String> {
        let criteria_type = criteria.criteria_type();
        let subject = criteria.subject().unwrap_or_default();
        let field = field_path(subject, self.info);
        let values = criteria.values();

        let expected = criteria_type.arity().unwrap_or(0);
        if values.len() != expected {
            log::error!(
                "{} criteria on '{}' expects {} value(s), got {}",
                criteria_type,
                subject,
                expected,
                values.len()
            );
            return Err(CosmosError::new(
                &format!(
                    "{} criteria on '{}' expects {} value(s), got {}",
                    criteria_type,
                    subject,
                    expected,
                    values.len()
                ),
                ErrorKind::InvalidQuery,
            ));
        }

        let values = if self.info.is_id_field(subject) {
            values.iter().map(stored_id).collect::<CosmosResult<Vec<_>>>()?
        } else {
            values.to_vec()
        };

        let text = match criteria_type {
            CriteriaType::IsEqual => format!("{} = {}", field, self.bind(&values[0])),
            CriteriaType::Not => format!("{} != {}", field, self.bind(&values[0])),
            CriteriaType::LessThan | CriteriaType::Before => {
                format!("{} < {}", field, self.bind(&values[0]))
            }
            CriteriaType::LessThanEqual => format!("{} <= {}", field, self.bind(&values[0])),
            CriteriaType::GreaterThan | CriteriaType::After => {
                format!("{} > {}", field, self.bind(&values[0]))
            }
            CriteriaType::GreaterThanEqual => format!("{} >= {}", field, self.bind(&values[0])),
            CriteriaType::Between => {
                let low = self.bind(&values[0]);
                let high = self.bind(&values[1]);
                format!("{} BETWEEN {} AND {}", field, low, high)
            }
            CriteriaType::In => format!("ARRAY_CONTAINS({}, {})", self.bind(&values[0]), field),
            CriteriaType::NotIn => {
                format!("NOT ARRAY_CONTAINS({}, {})", self.bind(&values[0]), field)
            }
            CriteriaType::Containing => format!("CONTAINS({}, {})", field, self.bind(&values[0])),
            CriteriaType::NotContaining => {
                format!("NOT CONTAINS({}, {})", field, self.bind(&values[0]))
            }
            CriteriaType::StartsWith => format!("STARTSWITH({}, {})", field, self.bind(&values[0])),
            CriteriaType::EndsWith => format!("ENDSWITH({}, {})", field, self.bind(&values[0])),
            CriteriaType::ArrayContains => {
                format!("ARRAY_CONTAINS({}, {})", field, self.bind(&values[0]))
            }
            CriteriaType::IsNull => format!("IS_NULL({})", field),
            CriteriaType::IsNotNull => format!("NOT IS_NULL({})", field),
            CriteriaType::Exists => format!("IS_DEFINED({})", field),
            CriteriaType::True => format!("{} = true", field),
            CriteriaType::False => format!("{} = false", field),
            CriteriaType::Near | CriteriaType::Within | CriteriaType::Regex => {
                log::error!("Criteria type {} is not supported", criteria_type);
                return Err(CosmosError::new(
                    &format!("Criteria type {} is not supported", criteria_type),
                    ErrorKind::UnsupportedOperation,
                ));
            }
            CriteriaType::All | CriteriaType::And | CriteriaType::Or => {
                log::error!("{} is not a leaf criteria type", criteria_type);
                return Err(CosmosError::new(
                    &format!("{} is not a leaf criteria type", criteria_type),
                    ErrorKind::InvalidQuery,
                ));
            }
        };
        Ok(text)
    }

    fn order_by(&self, sort: &Sort) -> String {
        if !sort.is_sorted() {
            return String::new();
        }
        let orders: Vec<String> = sort
            .orders()
            .iter()
            .map(|o| format!("{} {}", field_path(o.property(), self.info), o.direction()))
            .collect();
        format!(" ORDER BY {}", orders.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CosmosPageRequest;
    use serde_json::json;

    fn person() -> EntityInformation {
        EntityInformation::builder("Person")
            .container("people")
            .id_field("person_id")
            .partition_key("last_name")
            .property("person_id", "personId", false)
            .property("first_name", "firstName", false)
            .property("last_name", "lastName", false)
            .property("hobbies", "hobbies", true)
            .property("age", "age", false)
            .build()
    }

    fn translate(criteria: Criteria) -> SqlQuerySpec {
        generate_query(&DocumentQuery::new(criteria), &person()).unwrap()
    }

    #[test]
    fn test_equality_binds_parameter() {
        let spec = translate(Criteria::field("last_name").is("Smith"));
        assert_eq!(spec.query_text, "SELECT * FROM ROOT r WHERE r.lastName = @param0");
        assert_eq!(spec.parameters, vec![SqlParameter::new("@param0", "Smith")]);
    }

    #[test]
    fn test_id_field_addresses_reserved_id() {
        let spec = translate(Criteria::field("person_id").is("p1"));
        assert_eq!(spec.query_text, "SELECT * FROM ROOT r WHERE r.id = @param0");

        let spec = translate(Criteria::field("id").is("p1"));
        assert_eq!(spec.query_text, "SELECT * FROM ROOT r WHERE r.id = @param0");
    }

    #[test]
    fn test_numeric_id_values_bind_as_stored_strings() {
        let spec = translate(Criteria::field("person_id").is(7));
        assert_eq!(spec.parameters, vec![SqlParameter::new("@param0", "7")]);

        let spec = translate(Criteria::field("id").is_in([1, 2]).and("age").is(7));
        assert_eq!(
            spec.query_text,
            "SELECT * FROM ROOT r WHERE ARRAY_CONTAINS(@param0, r.id) AND r.age = @param1"
        );
        assert_eq!(spec.parameters[0], SqlParameter::new("@param0", json!(["1", "2"])));
        assert_eq!(spec.parameters[1], SqlParameter::new("@param1", 7));

        let spec = translate(Criteria::field("person_id").not_in(["a", "b"]));
        assert_eq!(spec.parameters[0], SqlParameter::new("@param0", json!(["a", "b"])));
    }

    #[test]
    fn test_all_inside_or_matches_everything() {
        let criteria = Criteria::or_any(vec![Criteria::all(), Criteria::field("last_name").is("Smith")]);
        assert!(criteria.is_all());
        assert_eq!(translate(criteria).query_text, "SELECT * FROM ROOT r");

        let nested = Criteria::field("age")
            .is(1)
            .and_criteria(Criteria::or_any(vec![Criteria::field("last_name").is("x"), Criteria::all()]));
        assert!(!nested.is_all());
        assert_eq!(translate(nested).query_text, "SELECT * FROM ROOT r WHERE r.age = @param0");
    }

    #[test]
    fn test_all_has_no_where() {
        assert_eq!(translate(Criteria::all()).query_text, "SELECT * FROM ROOT r");
        assert_eq!(translate(Criteria::and_all(vec![])).query_text, "SELECT * FROM ROOT r");
    }

    #[test]
    fn test_leaf_forms() {
        let cases = vec![
            (Criteria::field("age").is_not(1), "r.age != @param0"),
            (Criteria::field("age").less_than(1), "r.age < @param0"),
            (Criteria::field("age").before(1), "r.age < @param0"),
            (Criteria::field("age").less_than_equal(1), "r.age <= @param0"),
            (Criteria::field("age").greater_than(1), "r.age > @param0"),
            (Criteria::field("age").after(1), "r.age > @param0"),
            (Criteria::field("age").greater_than_equal(1), "r.age >= @param0"),
            (Criteria::field("age").between(1, 9), "r.age BETWEEN @param0 AND @param1"),
            (Criteria::field("age").is_in([1, 2]), "ARRAY_CONTAINS(@param0, r.age)"),
            (Criteria::field("age").not_in([1, 2]), "NOT ARRAY_CONTAINS(@param0, r.age)"),
            (Criteria::field("first_name").containing("a"), "CONTAINS(r.firstName, @param0)"),
            (Criteria::field("first_name").not_containing("a"), "NOT CONTAINS(r.firstName, @param0)"),
            (Criteria::field("first_name").starts_with("a"), "STARTSWITH(r.firstName, @param0)"),
            (Criteria::field("first_name").ends_with("a"), "ENDSWITH(r.firstName, @param0)"),
            (Criteria::field("hobbies").array_contains("golf"), "ARRAY_CONTAINS(r.hobbies, @param0)"),
            (Criteria::field("age").is_null(), "IS_NULL(r.age)"),
            (Criteria::field("age").is_not_null(), "NOT IS_NULL(r.age)"),
            (Criteria::field("age").exists(), "IS_DEFINED(r.age)"),
            (Criteria::field("active").is_true(), "r.active = true"),
            (Criteria::field("active").is_false(), "r.active = false"),
        ];
        for (criteria, predicate) in cases {
            let spec = translate(criteria);
            assert_eq!(spec.query_text, format!("SELECT * FROM ROOT r WHERE {}", predicate));
        }
    }

    #[test]
    fn test_unsupported_operators() {
        for criteria in [
            Criteria::field("location").near(json!([0, 0]), 10),
            Criteria::field("location").within(json!({"type": "Polygon"})),
            Criteria::field("first_name").regex("^A"),
        ] {
            let err = generate_query(&DocumentQuery::new(criteria), &person()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);
        }
    }

    #[test]
    fn test_unsupported_operator_nested_in_connective() {
        let criteria = Criteria::field("age").is(1).or("first_name").regex("x");
        let err = generate_query(&DocumentQuery::new(criteria), &person()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);
        assert!(err.message().contains("Regex"));
    }

    #[test]
    fn test_nested_connectives_are_parenthesized() {
        let criteria = Criteria::field("last_name")
            .is("Smith")
            .and_criteria(Criteria::field("age").less_than(20).or("age").greater_than(60));
        let spec = translate(criteria);
        assert_eq!(
            spec.query_text,
            "SELECT * FROM ROOT r WHERE r.lastName = @param0 AND (r.age < @param1 OR r.age > @param2)"
        );
        assert_eq!(spec.parameters.len(), 3);
        assert_eq!(spec.parameters[2], SqlParameter::new("@param2", 60));
    }

    #[test]
    fn test_single_child_connective_is_not_wrapped() {
        let criteria = Criteria::and_all(vec![
            Criteria::or_any(vec![Criteria::field("age").is(1)]),
            Criteria::all(),
            Criteria::field("last_name").is("x"),
        ]);
        let spec = translate(criteria);
        assert_eq!(
            spec.query_text,
            "SELECT * FROM ROOT r WHERE r.age = @param0 AND r.lastName = @param1"
        );
    }

    #[test]
    fn test_nested_and_bracketed_paths() {
        let info = person();
        assert_eq!(field_path("address.city", &info), "r.address.city");
        assert_eq!(field_path("first_name.x", &info), "r.firstName.x");
        assert_eq!(field_path("zip-code", &info), "r[\"zip-code\"]");
    }

    #[test]
    fn test_sort_limit_and_count() {
        let query = DocumentQuery::new(Criteria::field("age").greater_than(18))
            .with_sort(Sort::by("last_name").then_desc("age"))
            .with_limit(1);
        let spec = generate_query(&query, &person()).unwrap();
        assert_eq!(
            spec.query_text,
            "SELECT TOP 1 * FROM ROOT r WHERE r.age > @param0 ORDER BY r.lastName ASC, r.age DESC"
        );

        let count = generate_count_query(&query, &person()).unwrap();
        assert_eq!(count.query_text, "SELECT VALUE COUNT(1) FROM ROOT r WHERE r.age > @param0");
    }

    #[test]
    fn test_page_sort_is_applied() {
        let page = CosmosPageRequest::first(2).unwrap().with_sort(Sort::by_desc("person_id"));
        let query = DocumentQuery::all().with_page_request(page);
        let spec = generate_query(&query, &person()).unwrap();
        assert_eq!(spec.query_text, "SELECT * FROM ROOT r ORDER BY r.id DESC");
    }
}
