use super::ResourceStore;
use crate::error::StoreError;
use crate::scim::value::kind;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Users held in process memory, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    order: Vec<String>,
    users: HashMap<String, Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of user objects
    pub fn from_users(users: impl IntoIterator<Item = Value>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for user in users {
            store.insert(user)?;
        }
        Ok(store)
    }

    /// Parse seed data: either `{"users": [...]}` or a bare array of users
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let users = match serde_json::from_str::<Value>(text)? {
            Value::Array(users) => users,
            Value::Object(mut document) => match document.remove("users") {
                Some(Value::Array(users)) => users,
                Some(other) => {
                    return Err(StoreError::InvalidSeed(format!(
                        "\"users\" must be an array, got {}",
                        kind(&other)
                    )));
                }
                None => {
                    return Err(StoreError::InvalidSeed(
                        "expected an array of users or an object with a \"users\" array".into(),
                    ));
                }
            },
            other => {
                return Err(StoreError::InvalidSeed(format!(
                    "expected an array or object, got {}",
                    kind(&other)
                )));
            }
        };
        Self::from_users(users)
    }

    /// Load seed data from a file
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json(&text)?;
        info!(path = %path.display(), users = store.order.len(), "Loaded seed users");
        Ok(store)
    }
}

fn resource_id(resource: &Value) -> Result<String, StoreError> {
    let Value::Object(map) = resource else {
        return Err(StoreError::InvalidSeed(format!(
            "user must be an object, got {}",
            kind(resource)
        )));
    };
    match map.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        _ => Err(StoreError::InvalidSeed(
            "user is missing a non-empty string \"id\"".into(),
        )),
    }
}

impl ResourceStore for InMemoryStore {
    fn find(&self, id: &str) -> Option<Value> {
        self.users.get(id).cloned()
    }

    fn replace(&mut self, id: &str, resource: Value) -> Result<(), StoreError> {
        if !resource.is_object() {
            return Err(StoreError::NotAnObject {
                id: id.to_string(),
                found: kind(&resource),
            });
        }
        let slot = self
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        *slot = resource;
        debug!(id, "Replaced user");
        Ok(())
    }

    fn insert(&mut self, resource: Value) -> Result<(), StoreError> {
        let id = resource_id(&resource)?;
        if self.users.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.order.push(id.clone());
        self.users.insert(id.clone(), resource);
        debug!(id = %id, "Inserted user");
        Ok(())
    }

    fn all(&self) -> Vec<Value> {
        self.order
            .iter()
            .filter_map(|id| self.users.get(id).cloned())
            .collect()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}
