//! Filter evaluation against a resource

use super::ast::{FilterNode, Operator};
use crate::scim::path::AttributePath;
use crate::scim::value::resolve;
use serde_json::Value;
use std::cmp::Ordering;

/// Whether `resource` satisfies the filter.
///
/// Evaluation never fails: a missing attribute or an incompatible literal
/// simply does not match.
pub fn evaluate(node: &FilterNode, resource: &Value) -> bool {
    match node {
        FilterNode::Comparison { path, op, value } => compare(resource, path, *op, value),
        FilterNode::Presence { path } => resolve(resource, path).into_iter().any(is_present),
        FilterNode::Not(child) => !evaluate(child, resource),
        FilterNode::And(left, right) => evaluate(left, resource) && evaluate(right, resource),
        FilterNode::Or(left, right) => evaluate(left, resource) || evaluate(right, resource),
    }
}

fn compare(resource: &Value, path: &AttributePath, op: Operator, literal: &Value) -> bool {
    let candidates = comparable_values(resource, path);
    let fold_case = path.is("userName");

    match op {
        Operator::Eq => candidates.iter().any(|v| equals(v, literal, fold_case)),
        Operator::Ne => {
            candidates.is_empty() || candidates.iter().any(|v| !equals(v, literal, fold_case))
        }
        Operator::Co => string_test(&candidates, literal, fold_case, |h, n| h.contains(n)),
        Operator::Sw => string_test(&candidates, literal, fold_case, |h, n| h.starts_with(n)),
        Operator::Ew => string_test(&candidates, literal, fold_case, |h, n| h.ends_with(n)),
        Operator::Gt => ordered(&candidates, literal, Ordering::is_gt),
        Operator::Ge => ordered(&candidates, literal, Ordering::is_ge),
        Operator::Lt => ordered(&candidates, literal, Ordering::is_lt),
        Operator::Le => ordered(&candidates, literal, Ordering::is_le),
        Operator::Pr => resolve(resource, path).into_iter().any(is_present),
    }
}

static FALSE: Value = Value::Bool(false);
static EMPTY: Value = Value::String(String::new());

/// Values a comparison is tested against, with multi-valued leaves flattened.
fn comparable_values<'a>(resource: &'a Value, path: &AttributePath) -> Vec<&'a Value> {
    if path.root() == "roles" {
        return role_values(resource, path.child().unwrap_or("value"));
    }

    resolve(resource, path)
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            single => vec![single],
        })
        .collect()
}

/// One value per role for `field`.
///
/// A bare `roles` compares against each role's `value`. Roles lacking the
/// field read as `false` for `primary` and `""` for the string fields.
fn role_values<'a>(resource: &'a Value, field: &str) -> Vec<&'a Value> {
    let Some(Value::Array(roles)) = resource.get("roles") else {
        return Vec::new();
    };
    let fallback: &'static Value = if field == "primary" { &FALSE } else { &EMPTY };

    roles
        .iter()
        .filter_map(Value::as_object)
        .map(|role| role.get(field).unwrap_or(fallback))
        .collect()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn equals(actual: &Value, literal: &Value, fold_case: bool) -> bool {
    match (actual, literal) {
        (Value::String(a), Value::String(b)) if fold_case => a.to_lowercase() == b.to_lowercase(),
        (Value::Number(_), Value::Number(_)) => {
            compare_values(actual, literal) == Some(Ordering::Equal)
        }
        _ => actual == literal,
    }
}

fn string_test(
    candidates: &[&Value],
    literal: &Value,
    fold_case: bool,
    test: impl Fn(&str, &str) -> bool,
) -> bool {
    let Value::String(needle) = literal else {
        return false;
    };
    let needle = if fold_case {
        needle.to_lowercase()
    } else {
        needle.clone()
    };

    candidates.iter().any(|candidate| match candidate {
        Value::String(haystack) if fold_case => test(&haystack.to_lowercase(), needle.as_str()),
        Value::String(haystack) => test(haystack.as_str(), needle.as_str()),
        _ => false,
    })
}

fn ordered(candidates: &[&Value], literal: &Value, accept: fn(Ordering) -> bool) -> bool {
    candidates
        .iter()
        .any(|candidate| compare_values(candidate, literal).is_some_and(accept))
}

/// Order two values of the same kind.
///
/// Numbers compare as f64 and strings lexicographically; any other pairing
/// is incomparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
