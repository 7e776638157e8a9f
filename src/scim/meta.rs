//! Resource `meta` bookkeeping

use crate::scim::models::RESOURCE_TYPE;
use serde_json::{Map, Value};

/// Canonical URL of a user resource
pub fn location(base_url: &str, id: &str) -> String {
    format!("{}/Users/{}", base_url.trim_end_matches('/'), id)
}

/// Record a successful mutation in `meta`.
///
/// `meta` is created when missing or not an object. An existing `created`
/// is kept, `lastModified` is always set to `now`, and `resourceType` and
/// `location` are filled in when absent.
pub fn stamp(resource: &mut Map<String, Value>, now: &str, location: &str) {
    let meta = resource
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    let Value::Object(meta) = meta else {
        return;
    };

    meta.entry("created")
        .or_insert_with(|| Value::String(now.to_string()));
    meta.insert("lastModified".into(), Value::String(now.to_string()));
    meta.entry("resourceType")
        .or_insert_with(|| Value::String(RESOURCE_TYPE.to_string()));
    meta.entry("location")
        .or_insert_with(|| Value::String(location.to_string()));
}
