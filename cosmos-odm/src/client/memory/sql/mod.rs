//! Interpreter for the native query dialect, used by the in-memory client.

mod eval;
mod lexer;
mod parser;

use crate::client::SqlQuerySpec;
use crate::errors::CosmosResult;
use parser::Projection;
use serde_json::{json, Value};


/// Runs `spec` over `documents` and returns the full, unpaged result set.
///
/// Filtering, ordering and `TOP` are applied in that order. A count
/// projection yields a single number.
pub(crate) fn run<I>(spec: &SqlQuerySpec, documents: I) -> CosmosResult<Vec<Value>>
where
    I: IntoIterator<Item = Value>,
{
    let query = parser::parse(&spec.query_text)?;

    let mut selected = Vec::new();
    for document in documents {
        let keep = match &query.filter {
            Some(filter) => eval::evaluate(filter, &document, spec)? == Some(true),
            None => true,
        };
        if keep {
            selected.push(document);
        }
    }

    eval::sort(&mut selected, &query.order_by);
    if let Some(top) = query.top {
        selected.truncate(top);
    }

    Ok(match query.projection {
        Projection::All => selected,
        Projection::Count => vec![json!(selected.len())],
    })
}
