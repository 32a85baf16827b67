use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use crate::mapping::EntityInformation;
use crate::query::{Criteria, CriteriaType, Direction, Order, Sort};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static TOP: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(r"^top(\d*)$"));

const FIND_VERBS: [&str; 6] = ["find", "read", "get", "query", "search", "stream"];

/// Keyword word sequences, longest first within each operator.
const KEYWORDS: &[(&str, CriteriaType)] = &[
    ("is_greater_than_equal", CriteriaType::GreaterThanEqual),
    ("greater_than_equal", CriteriaType::GreaterThanEqual),
    ("is_less_than_equal", CriteriaType::LessThanEqual),
    ("less_than_equal", CriteriaType::LessThanEqual),
    ("is_not_containing", CriteriaType::NotContaining),
    ("not_containing", CriteriaType::NotContaining),
    ("not_contains", CriteriaType::NotContaining),
    ("is_starting_with", CriteriaType::StartsWith),
    ("starting_with", CriteriaType::StartsWith),
    ("starts_with", CriteriaType::StartsWith),
    ("is_ending_with", CriteriaType::EndsWith),
    ("ending_with", CriteriaType::EndsWith),
    ("ends_with", CriteriaType::EndsWith),
    ("is_greater_than", CriteriaType::GreaterThan),
    ("greater_than", CriteriaType::GreaterThan),
    ("is_less_than", CriteriaType::LessThan),
    ("less_than", CriteriaType::LessThan),
    ("is_containing", CriteriaType::Containing),
    ("containing", CriteriaType::Containing),
    ("contains", CriteriaType::Containing),
    ("is_not_null", CriteriaType::IsNotNull),
    ("not_null", CriteriaType::IsNotNull),
    ("is_null", CriteriaType::IsNull),
    ("null", CriteriaType::IsNull),
    ("is_not_in", CriteriaType::NotIn),
    ("not_in", CriteriaType::NotIn),
    ("is_in", CriteriaType::In),
    ("in", CriteriaType::In),
    ("is_between", CriteriaType::Between),
    ("between", CriteriaType::Between),
    ("is_before", CriteriaType::Before),
    ("before", CriteriaType::Before),
    ("is_after", CriteriaType::After),
    ("after", CriteriaType::After),
    ("is_not", CriteriaType::Not),
    ("not", CriteriaType::Not),
    ("is_true", CriteriaType::True),
    ("true", CriteriaType::True),
    ("is_false", CriteriaType::False),
    ("false", CriteriaType::False),
    ("exists", CriteriaType::Exists),
    ("is_near", CriteriaType::Near),
    ("near", CriteriaType::Near),
    ("is_within", CriteriaType::Within),
    ("within", CriteriaType::Within),
    ("matches_regex", CriteriaType::Regex),
    ("matches", CriteriaType::Regex),
    ("regex", CriteriaType::Regex),
    ("is_equal", CriteriaType::IsEqual),
    ("equals", CriteriaType::IsEqual),
    ("is", CriteriaType::IsEqual),
];

/// Kind of a derived query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Find { limit: Option<usize> },
    Exists,
    Delete,
}

/// One predicate of a derived query: a logical field and its operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    property: String,
    criteria_type: CriteriaType,
}

impl Part {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn criteria_type(&self) -> CriteriaType {
        self.criteria_type
    }

    /// Number of method arguments this part consumes.
    pub fn parameter_count(&self) -> usize {
        self.criteria_type.arity().unwrap_or(0)
    }
}

/// Parsed form of a derived query method name.
///
/// Names are snake case: a subject (`find`, `exists`, `delete`, ...), then
/// `_by_` and predicates joined by `_and_` / `_or_`, then an optional
/// `_order_by_` clause. `AND` binds tighter than `OR`.
///
/// ```rust
/// use cosmos_odm::mapping::EntityInformation;
/// use cosmos_odm::repository::query::PartTree;
///
/// let info = EntityInformation::builder("Person")
///     .property("last_name", "lastName", false)
///     .property("age", "age", false)
///     .build();
/// let tree = PartTree::parse("find_by_last_name_and_age_greater_than_order_by_age_desc", &info).unwrap();
/// assert_eq!(tree.parameter_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PartTree {
    subject: Subject,
    groups: Vec<Vec<Part>>,
    sort: Sort,
}

impl PartTree {
    pub fn parse(method_name: &str, entity: &EntityInformation) -> CosmosResult<PartTree> {
        let (head, order) = match method_name.split_once("_order_by_") {
            Some((head, order)) => (head, Some(order)),
            None => (method_name, None),
        };

        let (subject_text, predicate) = match head.split_once("_by_") {
            Some((subject, predicate)) => (subject, Some(predicate)),
            None => (head, None),
        };

        let subject = parse_subject(method_name, subject_text)?;
        let groups = match predicate {
            Some(predicate) => parse_predicate(method_name, predicate, entity)?,
            None => Vec::new(),
        };
        let sort = match order {
            Some(order) => parse_order(method_name, order, entity)?,
            None => Sort::unsorted(),
        };

        Ok(PartTree {
            subject,
            groups,
            sort,
        })
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn is_delete(&self) -> bool {
        self.subject == Subject::Delete
    }

    pub fn is_exists(&self) -> bool {
        self.subject == Subject::Exists
    }

    /// Result limit from `first` / `top<N>`.
    pub fn limit(&self) -> Option<usize> {
        match self.subject {
            Subject::Find { limit, .. } => limit,
            _ => None,
        }
    }

    /// OR-groups of AND-joined parts.
    pub fn groups(&self) -> &[Vec<Part>] {
        &self.groups
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn parameter_count(&self) -> usize {
        self.groups.iter().flatten().map(Part::parameter_count).sum()
    }

    /// Builds the criteria tree, binding `values` to the parts in order.
    pub fn to_criteria(&self, method_name: &str, values: &[Value]) -> CosmosResult<Criteria> {
        let expected = self.parameter_count();
        if values.len() < expected {
            log::error!(
                "Query method {} expects {} parameter(s), got {}",
                method_name,
                expected,
                values.len()
            );
            return Err(CosmosError::new(
                &format!(
                    "Query method {} expects {} parameter(s), got {}",
                    method_name,
                    expected,
                    values.len()
                ),
                ErrorKind::InvalidQuery,
            ));
        }
        if values.len() > expected {
            log::warn!(
                "Query method {} ignores {} surplus parameter(s)",
                method_name,
                values.len() - expected
            );
        }

        let mut remaining = values.iter();
        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut leaves = Vec::with_capacity(group.len());
            for part in group {
                let bound: Vec<Value> = remaining.by_ref().take(part.parameter_count()).cloned().collect();
                leaves.push(Criteria::new(&part.property, part.criteria_type, bound)?);
            }
            groups.push(single_or(leaves, Criteria::and_all));
        }

        Ok(match groups.len() {
            0 => Criteria::all(),
            _ => single_or(groups, Criteria::or_any),
        })
    }
}

fn single_or(mut items: Vec<Criteria>, combine: fn(Vec<Criteria>) -> Criteria) -> Criteria {
    if items.len() == 1 {
        items.remove(0)
    } else {
        combine(items)
    }
}

fn invalid(method_name: &str, reason: &str) -> CosmosError {
    log::error!("Cannot derive query from {}: {}", method_name, reason);
    CosmosError::new(
        &format!("Cannot derive query from {}: {}", method_name, reason),
        ErrorKind::InvalidQuery,
    )
}

fn parse_subject(method_name: &str, text: &str) -> CosmosResult<Subject> {
    let mut words = text.split('_').filter(|w| !w.is_empty());
    let verb = words.next().unwrap_or_default();

    match verb {
        "exists" => return Ok(Subject::Exists),
        "delete" | "remove" => return Ok(Subject::Delete),
        "count" => return Err(invalid(method_name, "count queries are not supported")),
        v if FIND_VERBS.contains(&v) => {}
        _ => return Err(invalid(method_name, &format!("unknown subject '{}'", verb))),
    }

    let top = TOP.as_ref().map_err(|e| {
        log::error!("Invalid top pattern: {}", e);
        CosmosError::new(&format!("Invalid top pattern: {}", e), ErrorKind::InternalError)
    })?;

    let mut limit = None;
    for word in words {
        if word == "first" {
            limit = Some(1);
        } else if word == "distinct" {
            // documents are returned whole, one per id
            continue;
        } else if let Some(captures) = top.captures(word) {
            let digits = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            limit = Some(if digits.is_empty() { 1 } else { digits.parse::<usize>()? });
        }
    }
    Ok(Subject::Find { limit })
}

fn parse_predicate(method_name: &str, text: &str, entity: &EntityInformation) -> CosmosResult<Vec<Vec<Part>>> {
    let words: Vec<&str> = text.split('_').filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return Err(invalid(method_name, "empty predicate"));
    }

    let mut groups = vec![Vec::new()];
    let mut pos = 0;
    loop {
        let (part, next) = parse_part(&words, pos, entity)
            .ok_or_else(|| invalid(method_name, &format!("no property found at '{}'", words[pos..].join("_"))))?;
        if let Some(group) = groups.last_mut() {
            group.push(part);
        }

        match words.get(next) {
            None => break,
            Some(&"and") => pos = next + 1,
            Some(&"or") => {
                groups.push(Vec::new());
                pos = next + 1;
            }
            Some(other) => return Err(invalid(method_name, &format!("unexpected '{}'", other))),
        }
        if pos >= words.len() {
            return Err(invalid(method_name, "dangling connective"));
        }
    }
    Ok(groups)
}

/// Matches the longest known field at `pos`, then an optional keyword.
fn parse_part(words: &[&str], pos: usize, entity: &EntityInformation) -> Option<(Part, usize)> {
    let boundary = |at: usize| at == words.len() || words[at] == "and" || words[at] == "or";

    for len in (1..=words.len() - pos).rev() {
        let property = words[pos..pos + len].join("_");
        if !entity.has_field(&property) {
            continue;
        }

        let after = pos + len;
        let keyword = KEYWORDS.iter().find_map(|(keyword, criteria_type)| {
            let keyword_words: Vec<&str> = keyword.split('_').collect();
            let end = after + keyword_words.len();
            (end <= words.len() && words[after..end] == keyword_words[..] && boundary(end))
                .then_some((*criteria_type, end))
        });

        let (criteria_type, next) = match keyword {
            Some(found) => found,
            None if boundary(after) => (CriteriaType::IsEqual, after),
            None => continue,
        };

        let criteria_type = match criteria_type {
            CriteriaType::Containing if entity.is_collection_field(&property) => CriteriaType::ArrayContains,
            other => other,
        };
        return Some((
            Part {
                property,
                criteria_type,
            },
            next,
        ));
    }
    None
}

fn parse_order(method_name: &str, text: &str, entity: &EntityInformation) -> CosmosResult<Sort> {
    let words: Vec<&str> = text.split('_').filter(|w| !w.is_empty()).collect();
    match parse_orders(&words, 0, entity) {
        Some(orders) if !orders.is_empty() => Ok(Sort::from_orders(orders)),
        _ => Err(invalid(method_name, &format!("invalid order clause '{}'", text))),
    }
}

fn parse_orders(words: &[&str], pos: usize, entity: &EntityInformation) -> Option<Vec<Order>> {
    if pos == words.len() {
        return Some(Vec::new());
    }

    for len in (1..=words.len() - pos).rev() {
        let property = words[pos..pos + len].join("_");
        if !entity.has_field(&property) {
            continue;
        }

        let mut next = pos + len;
        let direction = match words.get(next) {
            Some(&"desc") => {
                next += 1;
                Direction::Desc
            }
            Some(&"asc") => {
                next += 1;
                Direction::Asc
            }
            _ => Direction::Asc,
        };

        if let Some(mut rest) = parse_orders(words, next, entity) {
            rest.insert(0, Order::new(&property, direction));
            return Some(rest);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> EntityInformation {
        EntityInformation::builder("Person")
            .property("id", "id", false)
            .property("first_name", "firstName", false)
            .property("last_name", "lastName", false)
            .property("age", "age", false)
            .property("hobbies", "hobbies", true)
            .property("terms_and_conditions", "terms", false)
            .property("active", "active", false)
            .build()
    }

    fn parts(tree: &PartTree) -> Vec<Vec<(String, CriteriaType)>> {
        tree.groups()
            .iter()
            .map(|g| g.iter().map(|p| (p.property().to_string(), p.criteria_type())).collect())
            .collect()
    }

    #[test]
    fn test_simple_equality() {
        let tree = PartTree::parse("find_by_last_name", &person()).unwrap();
        assert_eq!(parts(&tree), vec![vec![("last_name".to_string(), CriteriaType::IsEqual)]]);
        assert_eq!(tree.subject(), Subject::Find { limit: None });
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let tree = PartTree::parse("find_by_first_name_and_last_name_or_age_greater_than", &person()).unwrap();
        assert_eq!(
            parts(&tree),
            vec![
                vec![
                    ("first_name".to_string(), CriteriaType::IsEqual),
                    ("last_name".to_string(), CriteriaType::IsEqual)
                ],
                vec![("age".to_string(), CriteriaType::GreaterThan)],
            ]
        );
        let criteria = tree
            .to_criteria("m", &[json!("A"), json!("B"), json!(3)])
            .unwrap();
        assert_eq!(criteria.criteria_type(), CriteriaType::Or);
        assert_eq!(criteria.sub_criteria()[0].criteria_type(), CriteriaType::And);
    }

    #[test]
    fn test_keywords() {
        let cases = [
            ("find_by_age_between", CriteriaType::Between),
            ("find_by_age_is_not_null", CriteriaType::IsNotNull),
            ("find_by_age_is_null", CriteriaType::IsNull),
            ("find_by_age_in", CriteriaType::In),
            ("find_by_age_not_in", CriteriaType::NotIn),
            ("find_by_age_less_than_equal", CriteriaType::LessThanEqual),
            ("find_by_first_name_starting_with", CriteriaType::StartsWith),
            ("find_by_first_name_ends_with", CriteriaType::EndsWith),
            ("find_by_first_name_containing", CriteriaType::Containing),
            ("find_by_active_true", CriteriaType::True),
            ("find_by_active_is_false", CriteriaType::False),
            ("find_by_age_exists", CriteriaType::Exists),
            ("find_by_first_name_is_not", CriteriaType::Not),
            ("find_by_first_name_regex", CriteriaType::Regex),
        ];
        for (name, expected) in cases {
            let tree = PartTree::parse(name, &person()).unwrap();
            assert_eq!(tree.groups()[0][0].criteria_type(), expected, "{}", name);
        }
    }

    #[test]
    fn test_containing_on_collection_is_array_contains() {
        let tree = PartTree::parse("find_by_hobbies_containing", &person()).unwrap();
        assert_eq!(tree.groups()[0][0].criteria_type(), CriteriaType::ArrayContains);
    }

    #[test]
    fn test_field_names_with_connective_words() {
        let tree = PartTree::parse("find_by_terms_and_conditions_and_age", &person()).unwrap();
        assert_eq!(
            parts(&tree),
            vec![vec![
                ("terms_and_conditions".to_string(), CriteriaType::IsEqual),
                ("age".to_string(), CriteriaType::IsEqual)
            ]]
        );
    }

    #[test]
    fn test_subjects() {
        let info = person();
        assert!(PartTree::parse("exists_by_age", &info).unwrap().is_exists());
        assert!(PartTree::parse("delete_by_age", &info).unwrap().is_delete());
        assert!(PartTree::parse("remove_by_age", &info).unwrap().is_delete());
        assert_eq!(PartTree::parse("find_first_by_age", &info).unwrap().limit(), Some(1));
        assert_eq!(PartTree::parse("find_top5_by_age", &info).unwrap().limit(), Some(5));
        assert_eq!(PartTree::parse("find_distinct_by_age", &info).unwrap().subject(), Subject::Find { limit: None });
        assert!(PartTree::parse("find_all", &info).unwrap().groups().is_empty());
    }

    #[test]
    fn test_invalid_names() {
        let info = person();
        for name in [
            "count_by_age",
            "fetch_by_age",
            "find_by_unknown",
            "find_by_age_and",
            "find_by_age_order_by_nothing",
            "find_by_",
        ] {
            let err = PartTree::parse(name, &info).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidQuery, "{}", name);
        }
    }

    #[test]
    fn test_order_clause() {
        let tree = PartTree::parse("find_by_age_order_by_last_name_asc_first_name_desc", &person()).unwrap();
        assert_eq!(tree.sort(), &Sort::by("last_name").then_desc("first_name"));
    }

    #[test]
    fn test_missing_parameter() {
        let tree = PartTree::parse("find_by_age_between", &person()).unwrap();
        let err = tree.to_criteria("find_by_age_between", &[json!(1)]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
        assert!(tree.to_criteria("find_by_age_between", &[json!(1), json!(2)]).is_ok());
    }

    #[test]
    fn test_find_all_is_all_criteria() {
        let tree = PartTree::parse("find_all", &person()).unwrap();
        assert!(tree.to_criteria("find_all", &[]).unwrap().is_all());
    }
}
