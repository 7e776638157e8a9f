//! MCP server handler
//!
//! Exposes the user tools over MCP. Users can also be read as resources at
//! `scim://Users/{id}`.

use crate::access_control::AccessResolver;
use crate::config::AppConfig;
use crate::scim::UserService;
use crate::store::{InMemoryStore, ResourceStore};
use crate::tools::{
    ContentBlock, SharedUserService, ToolContext, ToolOutput, ToolRegistry, definitions,
};
use rmcp::ErrorData as McpError;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, CompleteRequestParam, CompleteResult, CompletionInfo,
    Content, ErrorCode, Implementation, InitializeResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam, ReadResourceResult,
    ResourceContents, ResourcesCapability, ServerCapabilities, Tool, ToolsCapability,
};
use rmcp::service::{RequestContext, RoleServer};
use serde_json::{Map, Value, json};
use std::borrow::Cow;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};

/// URI scheme prefix of user resources
pub const RESOURCE_URI_PREFIX: &str = "scim://Users/";

const RESOURCE_MIME_TYPE: &str = "application/scim+json";

/// SCIM user MCP server handler
#[derive(Clone)]
pub struct ScimMcpHandler {
    name: String,
    version: String,
    registry: Arc<ToolRegistry>,
    service: SharedUserService,
    access: Arc<AccessResolver>,
}

impl ScimMcpHandler {
    pub fn new(
        config: &AppConfig,
        service: UserService<InMemoryStore>,
        access: AccessResolver,
    ) -> Self {
        Self::new_with_shared(config, Arc::new(Mutex::new(service)), Arc::new(access))
    }

    /// Handler over an existing shared service, e.g. to inspect the store in tests
    pub fn new_with_shared(
        config: &AppConfig,
        service: SharedUserService,
        access: Arc<AccessResolver>,
    ) -> Self {
        let mut registry = ToolRegistry::new();
        definitions::register_all_tools(&mut registry);

        info!(tools = registry.len(), "Initialized SCIM MCP handler");

        Self {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
            registry: Arc::new(registry),
            service,
            access,
        }
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    pub fn service(&self) -> &SharedUserService {
        &self.service
    }

    fn create_context(&self, request_id: &str) -> ToolContext {
        ToolContext::new(self.service.clone(), self.access.clone(), request_id)
    }

    fn to_mcp_result(&self, output: ToolOutput) -> CallToolResult {
        let content = output
            .content
            .into_iter()
            .map(|block| match block {
                ContentBlock::Text { text } => Content::text(text),
            })
            .collect();

        CallToolResult {
            content,
            is_error: Some(output.is_error),
            meta: None,
            structured_content: None,
        }
    }

    /// Registry tools as MCP tool definitions.
    ///
    /// Tools the access policy denies are listed with an `UNAVAILABLE: `
    /// description prefix.
    pub fn get_mcp_tools(&self) -> Vec<Tool> {
        self.registry
            .tools()
            .map(|tool| {
                let schema_value =
                    serde_json::to_value(&tool.input_schema).unwrap_or_else(|_| json!({}));

                let mut input_schema: Map<String, Value> = Map::new();
                input_schema.insert("type".to_string(), Value::String("object".to_string()));
                if let Some(props) = schema_value.get("properties") {
                    input_schema.insert("properties".to_string(), props.clone());
                }
                if let Some(required) = schema_value.get("required") {
                    input_schema.insert("required".to_string(), required.clone());
                }

                let description = if self.access.check(tool.name, tool.operation).is_denied() {
                    format!("UNAVAILABLE: {}", tool.description)
                } else {
                    tool.description.to_string()
                };

                Tool {
                    name: Cow::Owned(tool.name.to_string()),
                    description: Some(Cow::Owned(description)),
                    input_schema: Arc::new(input_schema),
                    annotations: None,
                    icons: None,
                    meta: None,
                    output_schema: None,
                    title: None,
                }
            })
            .collect()
    }

    fn get_tool_completions(&self, prefix: &str) -> Vec<String> {
        self.registry
            .tool_names()
            .filter(|name| name.starts_with(prefix))
            .map(str::to_string)
            .collect()
    }

    /// Ids of stored users starting with `prefix`
    fn get_user_id_completions(&self, prefix: &str) -> Vec<String> {
        let ctx = self.create_context("completion");
        ctx.with_service(|service| {
            service
                .store()
                .all()
                .iter()
                .filter_map(|user| user.get("id").and_then(Value::as_str))
                .filter(|id| id.starts_with(prefix))
                .map(str::to_string)
                .collect()
        })
    }

    /// Run a tool and turn any failure into an error result
    pub async fn execute_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> CallToolResult {
        let request_id = format!("{:x}", rand::random::<u64>());
        let ctx = self.create_context(&request_id);

        let args = arguments.map(Value::Object).unwrap_or_else(|| json!({}));

        match self.registry.execute(name, &ctx, args).await {
            Ok(output) => self.to_mcp_result(output),
            Err(e) => {
                if e.is_client_error() {
                    warn!(error = %e, request_id = %request_id, "Tool request rejected");
                } else {
                    error!(error = %e, request_id = %request_id, "Tool execution failed");
                }
                CallToolResult {
                    content: vec![Content::text(format!("Error: {}", e))],
                    is_error: Some(true),
                    meta: None,
                    structured_content: None,
                }
            }
        }
    }

    /// Read `scim://Users/{id}` through the `get_scim_user_by_id` tool so the
    /// same access policy applies
    pub async fn read_user_resource(&self, uri: &str) -> Result<String, McpError> {
        let id = parse_user_uri(uri)?;
        let request_id = format!("{:x}", rand::random::<u64>());
        let ctx = self.create_context(&request_id);

        let output = self
            .registry
            .execute("get_scim_user_by_id", &ctx, json!({ "id": id }))
            .await
            .map_err(|e| internal_error(e.to_string()))?;

        let text = output.as_text();
        if text == "null" {
            return Err(resource_not_found(uri));
        }
        Ok(text)
    }
}

impl ServerHandler for ScimMcpHandler {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                completions: Some(Map::new()),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "SCIM user provisioning simulator - list, filter, create, patch, replace and \
                 deactivate users"
                    .to_string(),
            ),
        }
    }

    #[instrument(skip(self, _context))]
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        debug!("Listing tools");
        async move {
            Ok(ListToolsResult {
                tools: self.get_mcp_tools(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        debug!(?request.arguments, "Calling tool");
        async move { Ok(self.execute_tool(&request.name, request.arguments).await) }
    }

    #[instrument(skip(self, _context))]
    fn complete(
        &self,
        request: CompleteRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CompleteResult, McpError>> + Send + '_ {
        async move {
            let prefix = &request.argument.value;
            let values = match request.argument.name.as_str() {
                "name" => self.get_tool_completions(prefix),
                "id" => self.get_user_id_completions(prefix),
                _ => Vec::new(),
            };

            let total = values.len() as u32;
            let has_more = values.len() > 100;
            Ok(CompleteResult {
                completion: CompletionInfo {
                    values: values.into_iter().take(100).collect(),
                    total: Some(total),
                    has_more: Some(has_more),
                },
            })
        }
    }

    /// Users are read directly by URI, nothing is listed
    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            Ok(ListResourcesResult {
                resources: vec![],
                next_cursor: None,
                meta: None,
            })
        }
    }

    #[instrument(skip(self, _context))]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        debug!(uri = %request.uri, "Reading resource");
        async move {
            let text = self.read_user_resource(&request.uri).await?;
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri: request.uri,
                    mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
                    text,
                    meta: None,
                }],
            })
        }
    }
}

/// Extract the user id from `scim://Users/{id}`
pub fn parse_user_uri(uri: &str) -> Result<&str, McpError> {
    let id = uri.strip_prefix(RESOURCE_URI_PREFIX).ok_or_else(|| {
        invalid_resource_uri(format!("expected {}{{id}}, got {}", RESOURCE_URI_PREFIX, uri))
    })?;
    if id.trim().is_empty() || id.contains('/') {
        return Err(invalid_resource_uri(format!("invalid user id in {}", uri)));
    }
    Ok(id)
}

fn internal_error(message: impl Into<Cow<'static, str>>) -> McpError {
    McpError {
        code: ErrorCode(-32603),
        message: message.into(),
        data: None,
    }
}

fn invalid_resource_uri(message: impl Into<Cow<'static, str>>) -> McpError {
    McpError {
        code: ErrorCode(-32602),
        message: message.into(),
        data: None,
    }
}

fn resource_not_found(uri: &str) -> McpError {
    McpError {
        code: ErrorCode(-32002),
        message: format!("Resource not found: {}", uri).into(),
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_uri() {
        assert_eq!(parse_user_uri("scim://Users/abc").unwrap(), "abc");
        assert!(parse_user_uri("scim://Groups/abc").is_err());
        assert!(parse_user_uri("scim://Users/").is_err());
        assert!(parse_user_uri("scim://Users/a/b").is_err());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let handler = ScimMcpHandler::new(
            &AppConfig::default(),
            UserService::new(InMemoryStore::new()),
            AccessResolver::allow_all(),
        );
        let result = handler.execute_tool("nope", None).await;
        assert_eq!(result.is_error, Some(true));
    }
}
