//! Error types for scim-sim
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API,
//! and convert to MCP tool results at the boundary.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("SCIM error: {0}")]
    Scim(#[from] ScimError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),

    #[error("Tool execution error: {0}")]
    Tool(#[from] ToolError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised by the SCIM query and patch engine and the user service.
///
/// Validation and business-rule variants guarantee the store was left
/// untouched. The `*Operation` variants are the only "unexpected" failures
/// and always carry the underlying cause.
#[derive(Error, Debug)]
pub enum ScimError {
    #[error("Invalid filter expression: {0}")]
    FilterSyntax(String),

    #[error("Unsupported filter attribute: {0}")]
    UnsupportedAttribute(String),

    #[error("Unsupported filter operator: {0}. Supported operators: eq, ne, co, sw, ew, pr, gt, ge, lt, le")]
    UnsupportedOperator(String),

    #[error("Invalid attributes: {}. Allowed attributes: {}", .invalid.join(", "), .allowed.join(", "))]
    InvalidAttribute {
        invalid: Vec<String>,
        allowed: Vec<String>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid patch data: {0}")]
    PatchValidation(String),

    #[error("{0}")]
    PatchForbidden(Forbidden),

    #[error("Failed to apply patch operations: {source}")]
    PatchOperation {
        #[source]
        source: OperationFailure,
    },

    #[error("Invalid user data: {0}")]
    UpdateValidation(String),

    #[error("{0}")]
    UpdateForbidden(Forbidden),

    #[error("Failed to update user: {source}")]
    UpdateOperation {
        #[source]
        source: OperationFailure,
    },

    #[error("User with userName '{user_name}' already exists")]
    Conflict { user_name: String },

    #[error("Invalid user data: {0}")]
    CreateValidation(String),

    #[error("Failed to create user in database: {source}")]
    CreateOperation {
        #[source]
        source: OperationFailure,
    },

    #[error("Failed to deactivate user: {source}")]
    DeleteOperation {
        #[source]
        source: OperationFailure,
    },
}

impl ScimError {
    /// Whether this error reports a business-rule violation (HTTP 403 in the real API)
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            ScimError::PatchForbidden(_) | ScimError::UpdateForbidden(_)
        )
    }

    /// Whether this error was caused by a malformed request rather than the data
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScimError::FilterSyntax(_)
                | ScimError::UnsupportedAttribute(_)
                | ScimError::UnsupportedOperator(_)
                | ScimError::InvalidAttribute { .. }
                | ScimError::InvalidArgument(_)
                | ScimError::PatchValidation(_)
                | ScimError::UpdateValidation(_)
                | ScimError::CreateValidation(_)
        )
    }
}

/// Business rule violation reported by a hook
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Forbidden {
    #[error("Self-deactivation is forbidden")]
    SelfDeactivation,

    #[error("Email domain change is forbidden by SSO policy ({from} -> {to})")]
    DomainChange { from: String, to: String },
}

/// Underlying cause of a failed mutation
#[derive(Error, Debug)]
pub enum OperationFailure {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Attribute path parsing and traversal errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("attribute path is empty")]
    Empty,

    #[error("malformed attribute path '{0}'")]
    Malformed(String),

    #[error("cannot traverse '{segment}' in '{path}': found {found}, expected an object")]
    NotAnObject {
        path: String,
        segment: String,
        found: &'static str,
    },
}

/// Resource store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),

    #[error("Resource with id '{0}' already exists")]
    DuplicateId(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource '{id}' is not a JSON object (found {found})")]
    NotAnObject { id: String, found: &'static str },
}

/// Access control errors
#[derive(Error, Debug)]
#[error("Access denied for tool '{tool}': {reason}")]
pub struct AccessDeniedError {
    pub tool: String,
    pub reason: String,
}

impl AccessDeniedError {
    pub fn new(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Scim(#[from] ScimError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),
}

impl ToolError {
    /// Whether the caller can fix this by changing the request
    pub fn is_client_error(&self) -> bool {
        match self {
            ToolError::InvalidArguments(_) | ToolError::NotFound(_) | ToolError::AccessDenied(_) => {
                true
            }
            ToolError::Scim(err) => err.is_validation() || err.is_forbidden(),
            ToolError::Serialization(_) => false,
        }
    }
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to start MCP session: {0}")]
    Initialize(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for engine and service operations
pub type ScimResult<T> = std::result::Result<T, ScimError>;

/// Result type alias for tool operations
pub type ToolResult<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_messages() {
        let err = ScimError::PatchForbidden(Forbidden::SelfDeactivation);
        assert!(err.to_string().contains("Self-deactivation is forbidden"));
        assert!(err.is_forbidden());

        let err = ScimError::UpdateForbidden(Forbidden::DomainChange {
            from: "x.com".into(),
            to: "y.com".into(),
        });
        assert!(
            err.to_string()
                .contains("Email domain change is forbidden by SSO policy")
        );
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_invalid_attribute_lists_both_sets() {
        let err = ScimError::InvalidAttribute {
            invalid: vec!["password".into(), "emails".into()],
            allowed: vec!["active".into(), "id".into()],
        };
        let message = err.to_string();
        assert!(message.contains("password, emails"));
        assert!(message.contains("Allowed attributes: active, id"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_operation_error_keeps_source() {
        use std::error::Error as _;

        let err = ScimError::PatchOperation {
            source: StoreError::NotFound("42".into()).into(),
        };
        assert!(err.to_string().starts_with("Failed to apply patch operations"));
        assert!(err.source().is_some());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_client_errors() {
        assert!(ToolError::InvalidArguments("missing id".into()).is_client_error());
        assert!(ToolError::from(ScimError::FilterSyntax("x".into())).is_client_error());
        assert!(
            ToolError::from(ScimError::PatchForbidden(Forbidden::SelfDeactivation))
                .is_client_error()
        );
        assert!(ToolError::from(AccessDeniedError::new("t", "r")).is_client_error());

        let store_failure = ScimError::DeleteOperation {
            source: StoreError::NotFound("42".into()).into(),
        };
        assert!(!ToolError::from(store_failure).is_client_error());

        let json_failure = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!ToolError::from(json_failure).is_client_error());
    }

    #[test]
    fn test_access_denied_message() {
        let err = AccessDeniedError::new("update_scim_user_by_id", "denied by pattern '^update_'");
        assert_eq!(
            err.to_string(),
            "Access denied for tool 'update_scim_user_by_id': denied by pattern '^update_'"
        );
    }
}
