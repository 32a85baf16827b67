use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// A named value bound into a [`SqlQuerySpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

impl SqlParameter {
    pub fn new<T: Into<Value>>(name: &str, value: T) -> Self {
        SqlParameter {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Native SQL query text plus its ordered parameter list.
///
/// Values never appear in `query_text`; they are referenced by name
/// (`@param0`, `@param1`, ...) and carried in `parameters`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SqlQuerySpec {
    pub query_text: String,
    pub parameters: Vec<SqlParameter>,
}

impl SqlQuerySpec {
    pub fn new(query_text: &str, parameters: Vec<SqlParameter>) -> Self {
        SqlQuerySpec {
            query_text: query_text.to_string(),
            parameters,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

impl Display for SqlQuerySpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.query_text)?;
        if !self.parameters.is_empty() {
            write!(f, " [")?;
            for (i, p) in self.parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", p.name, p.value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
