use super::parser::{CompareOp, Expr, Function, Operand, OrderItem};
use crate::client::SqlQuerySpec;
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluates `expr` against `document`.
///
/// Predicates are three-valued: `None` stands for *undefined*, the result of
/// touching a property the document does not have. Only `Some(true)` selects
/// a document.
pub(crate) fn evaluate(expr: &Expr, document: &Value, spec: &SqlQuerySpec) -> CosmosResult<Option<bool>> {
    match expr {
        Expr::Or(left, right) => {
            let l = evaluate(left, document, spec)?;
            if l == Some(true) {
                return Ok(Some(true));
            }
            let r = evaluate(right, document, spec)?;
            Ok(match (l, r) {
                (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            })
        }
        Expr::And(left, right) => {
            let l = evaluate(left, document, spec)?;
            if l == Some(false) {
                return Ok(Some(false));
            }
            let r = evaluate(right, document, spec)?;
            Ok(match (l, r) {
                (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            })
        }
        Expr::Not(inner) => Ok(evaluate(inner, document, spec)?.map(|b| !b)),
        Expr::Compare(op, left, right) => {
            let l = resolve(left, document, spec)?;
            let r = resolve(right, document, spec)?;
            Ok(match (l, r) {
                (Some(l), Some(r)) => compare(*op, l, r),
                _ => None,
            })
        }
        Expr::Between(value, low, high) => {
            let v = resolve(value, document, spec)?;
            let lo = resolve(low, document, spec)?;
            let hi = resolve(high, document, spec)?;
            Ok(match (v, lo, hi) {
                (Some(v), Some(lo), Some(hi)) => {
                    match (compare(CompareOp::Ge, v, lo), compare(CompareOp::Le, v, hi)) {
                        (Some(a), Some(b)) => Some(a && b),
                        _ => None,
                    }
                }
                _ => None,
            })
        }
        Expr::Call(function, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(resolve(arg, document, spec)?);
            }
            Ok(call(*function, &values))
        }
        Expr::Truthy(operand) => Ok(match resolve(operand, document, spec)? {
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => Some(false),
            None => None,
        }),
    }
}

/// Sorts `documents` by the `ORDER BY` items.
///
/// Values of different types order as undefined < null < boolean < number
/// < string < array < object.
pub(crate) fn sort(documents: &mut [Value], order_by: &[OrderItem]) {
    if order_by.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for item in order_by {
            let ordering = total_order(lookup(a, &item.path), lookup(b, &item.path));
            let ordering = if item.ascending { ordering } else { ordering.reverse() };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn resolve<'a>(operand: &'a Operand, document: &'a Value, spec: &'a SqlQuerySpec) -> CosmosResult<Option<&'a Value>> {
    match operand {
        Operand::Path(path) => Ok(lookup(document, path)),
        Operand::Literal(value) => Ok(Some(value)),
        Operand::Parameter(name) => match spec.parameter(name) {
            Some(value) => Ok(Some(value)),
            None => {
                log::error!("Parameter {} is referenced but not bound", name);
                Err(CosmosError::new(
                    &format!("Parameter {} is referenced but not bound", name),
                    ErrorKind::InvalidQuery,
                ))
            }
        },
    }
}

fn lookup<'a>(document: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = document;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Option<bool> {
    match op {
        CompareOp::Eq => Some(json_equals(left, right)),
        CompareOp::Ne => Some(!json_equals(left, right)),
        CompareOp::Lt => same_type_order(left, right).map(|o| o == Ordering::Less),
        CompareOp::Le => same_type_order(left, right).map(|o| o != Ordering::Greater),
        CompareOp::Gt => same_type_order(left, right).map(|o| o == Ordering::Greater),
        CompareOp::Ge => same_type_order(left, right).map(|o| o != Ordering::Less),
    }
}

fn call(function: Function, args: &[Option<&Value>]) -> Option<bool> {
    match function {
        Function::IsDefined => Some(args[0].is_some()),
        Function::IsNull => Some(matches!(args[0], Some(Value::Null))),
        Function::Contains => strings(args).map(|(s, sub)| s.contains(sub)),
        Function::StartsWith => strings(args).map(|(s, prefix)| s.starts_with(prefix)),
        Function::EndsWith => strings(args).map(|(s, suffix)| s.ends_with(suffix)),
        Function::ArrayContains => match (args[0], args[1]) {
            (Some(Value::Array(items)), Some(needle)) => {
                Some(items.iter().any(|item| json_equals(item, needle)))
            }
            _ => None,
        },
    }
}

fn strings<'a>(args: &[Option<&'a Value>]) -> Option<(&'a str, &'a str)> {
    match (args[0], args[1]) {
        (Some(Value::String(a)), Some(Value::String(b))) => Some((a.as_str(), b.as_str())),
        _ => None,
    }
}

/// Structural equality with numbers compared by value (`1 == 1.0`).
pub(crate) fn json_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| json_equals(v, w)))
        }
        _ => left == right,
    }
}

fn same_type_order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

fn total_order(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(l), Some(r)) => same_type_order(l, r)
            .unwrap_or_else(|| type_rank(left).cmp(&type_rank(right))),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}
