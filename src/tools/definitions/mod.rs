//! Tool definitions

pub mod users;

use crate::tools::ToolRegistry;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut ToolRegistry) {
    users::register(registry);
}
