//! SCIM PATCH (RFC 7644 §3.5.2)
//!
//! A request is validated as a whole before anything is touched. Operations
//! then run in order against a working copy; each one is first applied to a
//! proposed copy which the business rule hooks inspect before it replaces the
//! working copy. The caller commits the final working copy.

use crate::error::{PathError, ScimError, ScimResult};
use crate::scim::hooks::{Change, HookChain};
use crate::scim::models::{deserialize_some, is_email};
use crate::scim::path::AttributePath;
use crate::scim::value::{append_path, get_path, kind, remove_path, set_path};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Attributes that a pathless merge never writes
const MERGE_PROTECTED: &[&str] = &["id", "meta", "schemas"];

/// Paths that add/replace never write
const SET_PROTECTED: &[&str] = &["id", "schemas", "meta", "meta.created", "meta.resourceType"];

/// Paths that remove never deletes
const REMOVE_PROTECTED: &[&str] = &[
    "id",
    "schemas",
    "userName",
    "meta",
    "meta.created",
    "meta.resourceType",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPatchRequest {
    #[serde(default)]
    schemas: Option<Vec<String>>,
    #[serde(rename = "Operations")]
    operations: Vec<RawOperation>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOperation {
    op: PatchOp,
    #[serde(default)]
    path: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    value: Option<Value>,
}

/// A single validated operation
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation {
    Add {
        path: Option<AttributePath>,
        value: Value,
    },
    Remove {
        path: AttributePath,
    },
    Replace {
        path: Option<AttributePath>,
        value: Value,
    },
}

impl PatchOperation {
    pub fn op(&self) -> PatchOp {
        match self {
            PatchOperation::Add { .. } => PatchOp::Add,
            PatchOperation::Remove { .. } => PatchOp::Remove,
            PatchOperation::Replace { .. } => PatchOp::Replace,
        }
    }

    fn validate(index: usize, raw: RawOperation) -> Result<Self, String> {
        let path = raw
            .path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(AttributePath::parse)
            .transpose()
            .map_err(|e| format!("Operations[{index}].path: {e}"))?;

        if raw.op == PatchOp::Remove {
            let path = path.ok_or_else(|| {
                format!("Operations[{index}]: path is required when op is 'remove'")
            })?;
            return Ok(PatchOperation::Remove { path });
        }

        let value = raw.value.ok_or_else(|| {
            format!("Operations[{index}]: value is required when op is 'add' or 'replace'")
        })?;

        match &path {
            None => {
                let Value::Object(attributes) = &value else {
                    return Err(format!(
                        "Operations[{index}]: value must be an object when path is omitted, got {}",
                        kind(&value)
                    ));
                };
                if let Some(user_name) = attributes.get("userName") {
                    check_user_name(index, user_name)?;
                }
            }
            Some(path) if path.is("userName") => check_user_name(index, &value)?,
            Some(_) => {}
        }

        Ok(match raw.op {
            PatchOp::Add => PatchOperation::Add { path, value },
            _ => PatchOperation::Replace { path, value },
        })
    }
}

fn check_user_name(index: usize, value: &Value) -> Result<(), String> {
    let Value::String(user_name) = value else {
        return Err(format!(
            "Operations[{index}]: userName value must be a string, got {}",
            kind(value)
        ));
    };
    if !is_email(user_name) {
        return Err(format!(
            "Operations[{index}]: userName must be a valid email address"
        ));
    }
    Ok(())
}

/// A validated PATCH body
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRequest {
    pub schemas: Option<Vec<String>>,
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    /// Validate a raw request body. Fails with [`ScimError::PatchValidation`].
    pub fn from_value(body: &Value) -> ScimResult<Self> {
        if !body.is_object() {
            return Err(ScimError::PatchValidation(format!(
                "request body must be an object, got {}",
                kind(body)
            )));
        }

        let raw = RawPatchRequest::deserialize(body)
            .map_err(|e| ScimError::PatchValidation(e.to_string()))?;

        let operations = raw
            .operations
            .into_iter()
            .enumerate()
            .map(|(index, op)| PatchOperation::validate(index, op))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ScimError::PatchValidation)?;

        Ok(Self {
            schemas: raw.schemas,
            operations,
        })
    }
}

/// Applies validated operations under a set of business rules
#[derive(Debug)]
pub struct PatchApplier<'h> {
    hooks: &'h HookChain,
}

impl<'h> PatchApplier<'h> {
    pub fn new(hooks: &'h HookChain) -> Self {
        Self { hooks }
    }

    /// Apply every operation to a copy of `resource` and return the result.
    ///
    /// `resource` itself is never modified. Fails with
    /// [`ScimError::PatchForbidden`] when a hook objects and with
    /// [`ScimError::PatchOperation`] when a path cannot be traversed.
    pub fn apply(
        &self,
        resource: &Map<String, Value>,
        request: &PatchRequest,
    ) -> ScimResult<Map<String, Value>> {
        let mut working = resource.clone();

        for (index, operation) in request.operations.iter().enumerate() {
            let mut proposed = working.clone();
            let touched = apply_operation(&mut proposed, operation)
                .map_err(|e| ScimError::PatchOperation { source: e.into() })?;
            if touched.is_empty() {
                continue;
            }

            let change = Change {
                before: &working,
                after: &proposed,
                touched: &touched,
            };
            self.hooks
                .check(&change)
                .map_err(ScimError::PatchForbidden)?;

            debug!(index, op = ?operation.op(), ?touched, "Applied patch operation");
            working = proposed;
        }

        Ok(working)
    }
}

/// Apply one operation in place, returning the top-level attributes written
fn apply_operation(
    resource: &mut Map<String, Value>,
    operation: &PatchOperation,
) -> Result<Vec<String>, PathError> {
    match operation {
        PatchOperation::Remove { path } => {
            if is_protected(path, REMOVE_PROTECTED) {
                debug!(%path, "Skipping remove of protected attribute");
                return Ok(Vec::new());
            }
            remove_path(resource, path);
            Ok(vec![path.root().to_string()])
        }
        PatchOperation::Add { path: None, value } | PatchOperation::Replace { path: None, value } => {
            Ok(merge(resource, value))
        }
        PatchOperation::Add {
            path: Some(path),
            value,
        } => {
            if is_protected(path, SET_PROTECTED) {
                debug!(%path, "Skipping add to protected attribute");
                return Ok(Vec::new());
            }
            let appends = match get_path(resource, path) {
                Some(Value::Array(_)) => true,
                None | Some(Value::Null) => path.is("roles"),
                Some(_) => false,
            };
            if !(appends && append_path(resource, path, value.clone())?) {
                set_path(resource, path, value.clone())?;
            }
            Ok(vec![path.root().to_string()])
        }
        PatchOperation::Replace {
            path: Some(path),
            value,
        } => {
            if is_protected(path, SET_PROTECTED) {
                debug!(%path, "Skipping replace of protected attribute");
                return Ok(Vec::new());
            }
            set_path(resource, path, value.clone())?;
            Ok(vec![path.root().to_string()])
        }
    }
}

/// Shallow-merge an object into the resource root, skipping protected keys
fn merge(resource: &mut Map<String, Value>, value: &Value) -> Vec<String> {
    let Value::Object(attributes) = value else {
        return Vec::new();
    };

    let mut touched = Vec::new();
    for (key, val) in attributes {
        if MERGE_PROTECTED.contains(&key.as_str()) {
            debug!(attribute = %key, "Skipping merge of protected attribute");
            continue;
        }
        resource.insert(key.clone(), val.clone());
        touched.push(key.clone());
    }
    touched
}

fn is_protected(path: &AttributePath, protected: &[&str]) -> bool {
    protected.iter().any(|p| path.is(p))
}
