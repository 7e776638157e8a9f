//! Path traversal over JSON resource values
//!
//! Resources are `serde_json::Value` objects. Reads fan out over arrays of
//! objects (SCIM multi-valued attributes); writes only ever descend through
//! objects and report a typed [`PathError`] when they cannot.

use crate::error::PathError;
use crate::scim::path::AttributePath;
use serde_json::{Map, Value};

/// Collect every value addressed by `path`.
///
/// When a segment lands on an array, the remaining segments are resolved
/// against each object element. A missing attribute contributes nothing.
pub fn resolve<'a>(resource: &'a Value, path: &AttributePath) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect(resource, path.segments(), &mut found);
    found
}

fn collect<'a>(node: &'a Value, segments: &[String], found: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        found.push(node);
        return;
    };

    match node {
        Value::Object(map) => {
            if let Some(child) = map.get(head) {
                collect(child, rest, found);
            }
        }
        Value::Array(items) => {
            for item in items.iter().filter(|item| item.is_object()) {
                collect(item, segments, found);
            }
        }
        _ => {}
    }
}

/// Look up a single value without array fan-out
pub fn get_path<'a>(root: &'a Map<String, Value>, path: &AttributePath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    rest.iter()
        .try_fold(root.get(first)?, |node, segment| node.get(segment.as_str()))
}

/// Set the value at `path`, creating intermediate objects as needed.
///
/// A `null` intermediate is replaced by an empty object; any other
/// non-object intermediate is an error.
pub fn set_path(
    root: &mut Map<String, Value>,
    path: &AttributePath,
    value: Value,
) -> Result<(), PathError> {
    let (leaf, parent) = parent_mut(root, path)?;
    parent.insert(leaf.to_string(), value);
    Ok(())
}

/// Append to the array at `path`.
///
/// Array values are appended element by element. When the target does not
/// exist yet it is created as an array. Returns `false` without touching the
/// resource when the target exists but is not an array.
pub fn append_path(
    root: &mut Map<String, Value>,
    path: &AttributePath,
    value: Value,
) -> Result<bool, PathError> {
    let (leaf, parent) = parent_mut(root, path)?;
    let target = parent
        .entry(leaf.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if target.is_null() {
        *target = Value::Array(Vec::new());
    }

    let Value::Array(items) = target else {
        return Ok(false);
    };
    match value {
        Value::Array(values) => items.extend(values),
        single => items.push(single),
    }
    Ok(true)
}

/// Remove the value at `path`. Missing paths are a no-op.
pub fn remove_path(root: &mut Map<String, Value>, path: &AttributePath) -> Option<Value> {
    let (leaf, parents) = path.segments().split_last()?;
    let mut current = root;
    for segment in parents {
        current = current.get_mut(segment)?.as_object_mut()?;
    }
    current.remove(leaf)
}

fn parent_mut<'a, 'p>(
    root: &'a mut Map<String, Value>,
    path: &'p AttributePath,
) -> Result<(&'p str, &'a mut Map<String, Value>), PathError> {
    let (leaf, parents) = path
        .segments()
        .split_last()
        .ok_or(PathError::Empty)?;

    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            other => {
                return Err(PathError::NotAnObject {
                    path: path.to_string(),
                    segment: segment.clone(),
                    found: kind(other),
                });
            }
        };
    }

    Ok((leaf.as_str(), current))
}

/// Human-readable JSON type name
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
