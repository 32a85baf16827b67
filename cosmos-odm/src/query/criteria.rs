use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Operator of a [`Criteria`] node.
///
/// `All`, `And` and `Or` are structural; every other variant is a leaf
/// operator applied to a subject field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriteriaType {
    All,
    And,
    Or,
    IsEqual,
    Not,
    Before,
    After,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Containing,
    NotContaining,
    StartsWith,
    EndsWith,
    ArrayContains,
    Between,
    Exists,
    True,
    False,
    Near,
    Within,
    Regex,
}

impl CriteriaType {
    /// Whether this type combines child criteria.
    pub fn is_connective(&self) -> bool {
        matches!(self, CriteriaType::And | CriteriaType::Or)
    }

    /// Number of values a leaf of this type carries. `None` for
    /// structural types.
    pub fn arity(&self) -> Option<usize> {
        match self {
            CriteriaType::All | CriteriaType::And | CriteriaType::Or => None,
            CriteriaType::IsNull
            | CriteriaType::IsNotNull
            | CriteriaType::Exists
            | CriteriaType::True
            | CriteriaType::False => Some(0),
            CriteriaType::Between | CriteriaType::Near => Some(2),
            _ => Some(1),
        }
    }
}

impl Display for CriteriaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One node of a filter tree.
///
/// A leaf has a subject, a leaf operator and the operator's values. A
/// connective (`And`/`Or`) has children and no subject. `All` matches every
/// document.
///
/// # Examples
///
/// ```rust
/// use cosmos_odm::query::{Criteria, CriteriaType};
///
/// let criteria = Criteria::field("last_name")
///     .is("Smith")
///     .and("age")
///     .greater_than(30);
/// assert_eq!(criteria.criteria_type(), CriteriaType::And);
/// assert_eq!(criteria.sub_criteria().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    subject: Option<String>,
    criteria_type: CriteriaType,
    values: Vec<Value>,
    sub_criteria: Vec<Criteria>,
}

impl Criteria {
    /// Creates a leaf, checking the value arity of `criteria_type`.
    ///
    /// `In` and `NotIn` take a single array value.
    pub fn new(subject: &str, criteria_type: CriteriaType, values: Vec<Value>) -> CosmosResult<Criteria> {
        let arity = match criteria_type.arity() {
            Some(arity) => arity,
            None => {
                log::error!("{} is not a leaf criteria type", criteria_type);
                return Err(CosmosError::new(
                    &format!("{} is not a leaf criteria type", criteria_type),
                    ErrorKind::InvalidQuery,
                ));
            }
        };

        if subject.trim().is_empty() {
            log::error!("{} criteria needs a subject", criteria_type);
            return Err(CosmosError::new(
                &format!("{} criteria needs a subject", criteria_type),
                ErrorKind::InvalidQuery,
            ));
        }

        if values.len() != arity {
            log::error!(
                "{} criteria on '{}' expects {} value(s), got {}",
                criteria_type,
                subject,
                arity,
                values.len()
            );
            return Err(CosmosError::new(
                &format!(
                    "{} criteria on '{}' expects {} value(s), got {}",
                    criteria_type,
                    subject,
                    arity,
                    values.len()
                ),
                ErrorKind::InvalidQuery,
            ));
        }

        if matches!(criteria_type, CriteriaType::In | CriteriaType::NotIn) && !values[0].is_array() {
            log::error!("{} criteria on '{}' expects an array value", criteria_type, subject);
            return Err(CosmosError::new(
                &format!("{} criteria on '{}' expects an array value", criteria_type, subject),
                ErrorKind::InvalidQuery,
            ));
        }

        Ok(Criteria::leaf(subject, criteria_type, values))
    }

    /// Criteria matching every document.
    pub fn all() -> Criteria {
        Criteria {
            subject: None,
            criteria_type: CriteriaType::All,
            values: Vec::new(),
            sub_criteria: Vec::new(),
        }
    }

    /// Conjunction of `children`.
    pub fn and_all(children: Vec<Criteria>) -> Criteria {
        Criteria::connective(CriteriaType::And, children)
    }

    /// Disjunction of `children`.
    pub fn or_any(children: Vec<Criteria>) -> Criteria {
        Criteria::connective(CriteriaType::Or, children)
    }

    /// Starts a fluent leaf on `subject`.
    pub fn field(subject: &str) -> FieldCriteria {
        FieldCriteria {
            subject: subject.to_string(),
            pending: None,
        }
    }

    /// Continues the chain with a leaf joined by `AND`.
    pub fn and(self, subject: &str) -> FieldCriteria {
        FieldCriteria {
            subject: subject.to_string(),
            pending: Some((CriteriaType::And, self)),
        }
    }

    /// Continues the chain with a leaf joined by `OR`.
    pub fn or(self, subject: &str) -> FieldCriteria {
        FieldCriteria {
            subject: subject.to_string(),
            pending: Some((CriteriaType::Or, self)),
        }
    }

    /// Joins `self` and `other` with `AND`.
    pub fn and_criteria(self, other: Criteria) -> Criteria {
        combine(CriteriaType::And, self, other)
    }

    /// Joins `self` and `other` with `OR`.
    pub fn or_criteria(self, other: Criteria) -> Criteria {
        combine(CriteriaType::Or, self, other)
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn criteria_type(&self) -> CriteriaType {
        self.criteria_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn sub_criteria(&self) -> &[Criteria] {
        &self.sub_criteria
    }

    /// Whether this node matches every document.
    pub fn is_all(&self) -> bool {
        match self.criteria_type {
            CriteriaType::All => true,
            CriteriaType::And => self.sub_criteria.iter().all(|c| c.is_all()),
            CriteriaType::Or => self.sub_criteria.is_empty() || self.sub_criteria.iter().any(|c| c.is_all()),
            _ => false,
        }
    }

    fn leaf(subject: &str, criteria_type: CriteriaType, values: Vec<Value>) -> Criteria {
        Criteria {
            subject: Some(subject.to_string()),
            criteria_type,
            values,
            sub_criteria: Vec::new(),
        }
    }

    fn connective(criteria_type: CriteriaType, children: Vec<Criteria>) -> Criteria {
        Criteria {
            subject: None,
            criteria_type,
            values: Vec::new(),
            sub_criteria: children,
        }
    }
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria::all()
    }
}

/// Flattens same-connective chains so `a AND b AND c` is one node.
fn combine(connective: CriteriaType, left: Criteria, right: Criteria) -> Criteria {
    let mut children = Vec::new();
    for side in [left, right] {
        if side.criteria_type == connective {
            children.extend(side.sub_criteria);
        } else {
            children.push(side);
        }
    }
    Criteria::connective(connective, children)
}

/// Fluent builder of a leaf on one subject.
///
/// Every operator finishes the leaf and joins it to the chain built so far.
pub struct FieldCriteria {
    subject: String,
    pending: Option<(CriteriaType, Criteria)>,
}

impl FieldCriteria {
    pub fn is<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::IsEqual, vec![value.into()])
    }

    pub fn is_not<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::Not, vec![value.into()])
    }

    pub fn less_than<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::LessThan, vec![value.into()])
    }

    pub fn less_than_equal<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::LessThanEqual, vec![value.into()])
    }

    pub fn greater_than<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::GreaterThan, vec![value.into()])
    }

    pub fn greater_than_equal<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::GreaterThanEqual, vec![value.into()])
    }

    pub fn before<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::Before, vec![value.into()])
    }

    pub fn after<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::After, vec![value.into()])
    }

    pub fn between<L: Into<Value>, H: Into<Value>>(self, low: L, high: H) -> Criteria {
        self.finish(CriteriaType::Between, vec![low.into(), high.into()])
    }

    pub fn is_in<I, T>(self, values: I) -> Criteria
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let array = Value::Array(values.into_iter().map(Into::into).collect());
        self.finish(CriteriaType::In, vec![array])
    }

    pub fn not_in<I, T>(self, values: I) -> Criteria
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let array = Value::Array(values.into_iter().map(Into::into).collect());
        self.finish(CriteriaType::NotIn, vec![array])
    }

    pub fn containing<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::Containing, vec![value.into()])
    }

    pub fn not_containing<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::NotContaining, vec![value.into()])
    }

    pub fn starts_with<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::StartsWith, vec![value.into()])
    }

    pub fn ends_with<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::EndsWith, vec![value.into()])
    }

    pub fn array_contains<T: Into<Value>>(self, value: T) -> Criteria {
        self.finish(CriteriaType::ArrayContains, vec![value.into()])
    }

    pub fn is_null(self) -> Criteria {
        self.finish(CriteriaType::IsNull, Vec::new())
    }

    pub fn is_not_null(self) -> Criteria {
        self.finish(CriteriaType::IsNotNull, Vec::new())
    }

    pub fn exists(self) -> Criteria {
        self.finish(CriteriaType::Exists, Vec::new())
    }

    pub fn is_true(self) -> Criteria {
        self.finish(CriteriaType::True, Vec::new())
    }

    pub fn is_false(self) -> Criteria {
        self.finish(CriteriaType::False, Vec::new())
    }

    pub fn near<P: Into<Value>, D: Into<Value>>(self, point: P, distance: D) -> Criteria {
        self.finish(CriteriaType::Near, vec![point.into(), distance.into()])
    }

    pub fn within<T: Into<Value>>(self, shape: T) -> Criteria {
        self.finish(CriteriaType::Within, vec![shape.into()])
    }

    pub fn regex(self, pattern: &str) -> Criteria {
        self.finish(CriteriaType::Regex, vec![Value::String(pattern.to_string())])
    }

    fn finish(self, criteria_type: CriteriaType, values: Vec<Value>) -> Criteria {
        let leaf = Criteria::leaf(&self.subject, criteria_type, values);
        match self.pending {
            Some((connective, left)) => combine(connective, left, leaf),
            None => leaf,
        }
    }
}
