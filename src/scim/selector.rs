//! Attribute selection and projection
//!
//! An attribute selector is the comma-separated `attributes` request
//! parameter (`userName,name.givenName`). Projection builds a reduced copy of
//! a resource containing only the selected attributes plus `schemas`.

use crate::error::{ScimError, ScimResult};
use crate::scim::path::{AttributePath, allowed_attributes_sorted};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::trace;

/// A validated set of attribute paths. Empty means "no projection".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    paths: Vec<AttributePath>,
}

impl AttributeSelection {
    /// Selection that leaves resources untouched
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[AttributePath] {
        &self.paths
    }

    /// Whether the dotted attribute was selected verbatim
    pub fn contains(&self, dotted: &str) -> bool {
        self.paths.iter().any(|p| p.is(dotted))
    }
}

/// Parse an attribute selector.
///
/// `None` and `""` select everything. Otherwise every non-empty segment must
/// be on the allow-list; all offending segments are reported together.
pub fn parse_selector(selector: Option<&str>) -> ScimResult<AttributeSelection> {
    let Some(selector) = selector.filter(|s| !s.is_empty()) else {
        return Ok(AttributeSelection::all());
    };

    let segments: Vec<&str> = selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let invalid: Vec<String> = segments
        .iter()
        .filter(|s| AttributePath::allowed(s).is_none())
        .map(|s| s.to_string())
        .collect();

    if segments.is_empty() || !invalid.is_empty() {
        return Err(ScimError::InvalidAttribute {
            invalid,
            allowed: allowed_attributes_sorted(),
        });
    }

    let mut seen = BTreeSet::new();
    let paths = segments
        .into_iter()
        .filter_map(AttributePath::allowed)
        .filter(|p| seen.insert(p.clone()))
        .collect();

    Ok(AttributeSelection { paths })
}

/// Build a copy of `resource` restricted to `selection`.
///
/// - top-level paths copy the attribute as is
/// - `parent.child` keeps only `child` of the parent object, skipping null
///   or absent values; for arrays (`roles`) every element is reduced to
///   `child` and elements left empty are dropped
/// - selecting a whole container wins over selecting its children
/// - containers built from children that end up empty are omitted
/// - `schemas` is always carried over
pub fn project(resource: &Value, selection: &AttributeSelection) -> Value {
    let Value::Object(source) = resource else {
        return resource.clone();
    };
    if selection.is_empty() {
        return resource.clone();
    }

    let mut projected = Map::new();
    let mut built = BTreeSet::new();

    for path in selection.paths() {
        let root = path.root();
        let Some(value) = source.get(root) else {
            continue;
        };

        let Some(child) = path.child() else {
            projected.insert(root.to_string(), value.clone());
            continue;
        };
        if selection.contains(root) {
            continue;
        }

        match value {
            Value::Object(inner) => {
                if let Some(v) = inner.get(child).filter(|v| !v.is_null()) {
                    let target = projected
                        .entry(root)
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(target) = target {
                        target.insert(child.to_string(), v.clone());
                    }
                }
            }
            Value::Array(items) => {
                let target = projected
                    .entry(root)
                    .or_insert_with(|| Value::Array(vec![Value::Object(Map::new()); items.len()]));
                if let Value::Array(target) = target {
                    for (slot, item) in target.iter_mut().zip(items) {
                        let picked = item.get(child).filter(|v| !v.is_null());
                        if let (Value::Object(slot), Some(v)) = (slot, picked) {
                            slot.insert(child.to_string(), v.clone());
                        }
                    }
                }
            }
            _ => continue,
        }
        built.insert(root.to_string());
    }

    for root in built {
        let empty = match projected.get_mut(&root) {
            Some(Value::Array(items)) => {
                items.retain(|item| !matches!(item, Value::Object(m) if m.is_empty()));
                items.is_empty()
            }
            Some(Value::Object(map)) => map.is_empty(),
            _ => false,
        };
        if empty {
            projected.remove(&root);
        }
    }

    if let Some(schemas) = source.get("schemas") {
        projected.insert("schemas".to_string(), schemas.clone());
    }

    trace!(
        selected = selection.paths().len(),
        kept = projected.len(),
        "Projected resource"
    );
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> Value {
        json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "1",
            "userName": "jdoe@x.com",
            "name": {"givenName": "Jane", "familyName": "Doe"},
            "active": true,
            "roles": [
                {"value": "admin", "display": "Admin"},
                {"value": "buyer"}
            ],
            "meta": {"resourceType": "User", "created": "2024-01-01T00:00:00Z"}
        })
    }

    fn select(selector: &str) -> AttributeSelection {
        parse_selector(Some(selector)).unwrap()
    }

    #[test]
    fn test_none_and_empty_select_everything() {
        assert!(parse_selector(None).unwrap().is_empty());
        assert!(parse_selector(Some("")).unwrap().is_empty());
        assert_eq!(project(&user(), &AttributeSelection::all()), user());
    }

    #[test]
    fn test_trims_and_drops_empty_segments() {
        let selection = select(" userName ,, name.givenName ,");
        assert_eq!(selection.paths().len(), 2);
        assert!(selection.contains("name.givenName"));
    }

    #[test]
    fn test_only_commas_is_invalid() {
        let err = parse_selector(Some(" , ,")).unwrap_err();
        assert!(matches!(err, ScimError::InvalidAttribute { ref invalid, .. } if invalid.is_empty()));
    }

    #[test]
    fn test_reports_all_invalid_segments() {
        let err = parse_selector(Some("userName,password,emails")).unwrap_err();
        let ScimError::InvalidAttribute { invalid, allowed } = err else {
            panic!("expected InvalidAttribute");
        };
        assert_eq!(invalid, vec!["password", "emails"]);
        assert_eq!(allowed, allowed_attributes_sorted());
    }

    #[test]
    fn test_projects_nested_child() {
        let projected = project(&user(), &select("userName,name.givenName"));
        assert_eq!(
            projected,
            json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "jdoe@x.com",
                "name": {"givenName": "Jane"}
            })
        );
    }

    #[test]
    fn test_projects_roles_field() {
        let projected = project(&user(), &select("roles.display"));
        assert_eq!(projected["roles"], json!([{"display": "Admin"}]));

        let projected = project(&user(), &select("roles.value,roles.display"));
        assert_eq!(
            projected["roles"],
            json!([{"value": "admin", "display": "Admin"}, {"value": "buyer"}])
        );

        let projected = project(&user(), &select("roles.type"));
        assert!(projected.get("roles").is_none());
    }

    #[test]
    fn test_whole_container_wins() {
        let projected = project(&user(), &select("name.givenName,name"));
        assert_eq!(projected["name"], json!({"givenName": "Jane", "familyName": "Doe"}));
    }

    #[test]
    fn test_missing_child_omits_container() {
        let projected = project(&user(), &select("meta.location"));
        assert_eq!(
            projected,
            json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"]})
        );
    }

    #[test]
    fn test_idempotent() {
        let selection = select("id,name.familyName,roles.value,meta.created");
        let once = project(&user(), &selection);
        assert_eq!(project(&once, &selection), once);
    }
}
