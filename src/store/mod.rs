//! Resource storage
//!
//! The user service only talks to storage through [`ResourceStore`]. The
//! in-process [`InMemoryStore`] is the only implementation and can be seeded
//! from a JSON file.

mod memory;

pub use memory::InMemoryStore;

use crate::error::StoreError;
use serde_json::Value;

/// Storage for user resources keyed by their `id` attribute
pub trait ResourceStore: Send {
    /// Copy of the resource with `id`, if any
    fn find(&self, id: &str) -> Option<Value>;

    /// Replace an existing resource
    fn replace(&mut self, id: &str, resource: Value) -> Result<(), StoreError>;

    /// Add a new resource. Its `id` must not be taken.
    fn insert(&mut self, resource: Value) -> Result<(), StoreError>;

    /// Copies of all resources in storage order
    fn all(&self) -> Vec<Value>;

    fn len(&self) -> usize {
        self.all().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
