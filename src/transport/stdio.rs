//! Stdio transport

use crate::error::TransportError;
use crate::server::ScimMcpHandler;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::info;

/// Serve `handler` on stdin/stdout until the client disconnects
pub async fn run_stdio(handler: ScimMcpHandler) -> anyhow::Result<()> {
    info!(tools = handler.tool_count(), "Starting SCIM MCP server with stdio transport");

    let server = handler
        .serve(stdio())
        .await
        .map_err(|e| TransportError::Initialize(e.to_string()))?;

    server.waiting().await?;

    info!("SCIM MCP server stopped");
    Ok(())
}
