//! Tool registry
//!
//! Holds the available tools and runs them behind the access check.

use crate::access_control::{AccessControlled, AccessDecision, OperationType};
use crate::error::{AccessDeniedError, ToolError};
use crate::tools::executor::{ToolContext, ToolExecutor, ToolInfo, ToolOutput};
// async_trait keeps ToolHandler dyn-compatible
use async_trait::async_trait;
use schemars::Schema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A registered tool with its metadata
pub struct RegisteredTool {
    pub name: &'static str,
    pub description: &'static str,
    pub operation: OperationType,
    /// JSON Schema of the arguments
    pub input_schema: Schema,
    handler: Box<dyn ToolHandler>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// Type-erased tool
#[async_trait]
trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError>;
}

struct TypedToolHandler<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

#[async_trait]
impl<T> ToolHandler for TypedToolHandler<T>
where
    T: ToolExecutor + DeserializeOwned + AccessControlled + Send + Sync + 'static,
{
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let tool: T = serde_json::from_value(args).map_err(|e| {
            ToolError::InvalidArguments(format!("Failed to parse arguments: {}", e))
        })?;
        debug!(
            tool = tool.tool_name(),
            operation = %tool.operation_type(),
            "Parsed tool arguments"
        );
        tool.execute(ctx).await
    }
}

/// Tool registry, iterated in registration order
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, RegisteredTool>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Registering the same name twice replaces the first.
    pub fn register<T>(&mut self)
    where
        T: ToolExecutor
            + DeserializeOwned
            + AccessControlled
            + schemars::JsonSchema
            + ToolInfo
            + Send
            + Sync
            + 'static,
    {
        let name = <T as ToolInfo>::name();
        let tool = RegisteredTool {
            name,
            description: <T as ToolInfo>::description(),
            operation: <T as ToolInfo>::operation_type(),
            input_schema: schemars::schema_for!(T),
            handler: Box::new(TypedToolHandler::<T> {
                _marker: std::marker::PhantomData,
            }),
        };

        if self.tools.insert(name, tool).is_none() {
            self.order.push(name);
        }
        debug!(name, "Registered tool");
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().copied()
    }

    pub fn tools(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Check access, then run the tool
    #[instrument(skip(self, ctx, args), fields(tool = %name, request_id = %ctx.request_id))]
    pub async fn execute(
        &self,
        name: &str,
        ctx: &ToolContext,
        args: Value,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();

        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if let AccessDecision::Denied(reason) = ctx.access.check(name, tool.operation) {
            warn!(reason = %reason, "Access denied to tool");
            return Err(ToolError::AccessDenied(AccessDeniedError::new(name, reason)));
        }

        let result = tool.handler.call(ctx, args).await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(output) => info!(elapsed_ms, is_error = output.is_error, "Tool finished"),
            Err(e) => warn!(elapsed_ms, error = %e, "Tool failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.tool_names().count(), 0);
    }
}
