//! Access control types

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a tool does to the user store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// list, get
    Read,
    /// create, patch, replace
    Write,
    /// deactivate
    Delete,
}

impl OperationType {
    pub fn is_read_only(&self) -> bool {
        matches!(self, OperationType::Read)
    }

    pub fn is_mutating(&self) -> bool {
        !self.is_read_only()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Read => "read",
            OperationType::Write => "write",
            OperationType::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every tool (generated by `#[scim_tool]`)
pub trait AccessControlled {
    fn tool_name(&self) -> &'static str;

    fn operation_type(&self) -> OperationType;
}
