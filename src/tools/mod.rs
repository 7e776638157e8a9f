//! Tools module
//!
//! MCP tools over the SCIM user service.

pub mod definitions;
pub mod executor;
pub mod registry;

pub use executor::{ContentBlock, SharedUserService, ToolContext, ToolExecutor, ToolInfo, ToolOutput};
pub use registry::{RegisteredTool, ToolRegistry};

pub use scim_sim_macros::scim_tool;
