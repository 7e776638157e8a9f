//! Tool execution context and output types

use crate::access_control::{AccessResolver, OperationType};
use crate::error::ToolError;
use crate::scim::UserService;
use crate::store::InMemoryStore;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// The user service shared by every tool call
pub type SharedUserService = Arc<Mutex<UserService<InMemoryStore>>>;

/// Everything a tool needs to run one call
#[derive(Clone)]
pub struct ToolContext {
    pub service: SharedUserService,
    pub access: Arc<AccessResolver>,
    /// Correlates log lines of one call
    pub request_id: String,
}

impl ToolContext {
    pub fn new(
        service: SharedUserService,
        access: Arc<AccessResolver>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            access,
            request_id: request_id.into(),
        }
    }

    /// Run `f` with exclusive access to the user service.
    ///
    /// A poisoned lock is recovered: mutations only commit a fully built
    /// copy, so the store is never left half-written.
    pub fn with_service<R>(&self, f: impl FnOnce(&mut UserService<InMemoryStore>) -> R) -> R {
        let mut guard = self
            .service
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// One block of tool output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text { text: String },
}

/// Result of a successful tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Pretty-printed JSON of `value`
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        Ok(Self::text(serde_json::to_string_pretty(value)?))
    }

    pub fn json_value(value: Value) -> Result<Self, ToolError> {
        Self::json(&value)
    }

    /// Concatenated text of all blocks
    pub fn as_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Static tool metadata, generated by `#[scim_tool]`
pub trait ToolInfo {
    fn name() -> &'static str;

    fn description() -> &'static str;

    fn operation_type() -> OperationType;
}

/// Tool behavior
#[async_trait]
pub trait ToolExecutor {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}
