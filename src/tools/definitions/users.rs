//! SCIM user tools
//!
//! One tool per user endpoint. Results are pretty-printed JSON; a missing
//! user is reported as `null`.

use crate::error::ToolError;
use crate::scim::{ListQuery, SortOrder};
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use async_trait::async_trait;
use scim_sim_macros::scim_tool;
use serde_json::Value;

/// List users
#[scim_tool(
    name = "list_scim_users",
    description = "List SCIM users with optional filtering, attribute selection, sorting and pagination",
    operation = "read"
)]
pub struct ListScimUsers {
    /// SCIM filter expression, e.g. `userName eq "jane@example.com"`
    #[serde(default)]
    pub filter: Option<String>,
    /// Comma-separated attributes to return, e.g. `userName,name.givenName`
    #[serde(default)]
    pub attributes: Option<String>,
    /// 1-based index of the first result (default 1)
    #[serde(default, rename = "startIndex")]
    pub start_index: Option<i64>,
    /// Page size (default 100, max 1000)
    #[serde(default)]
    pub count: Option<i64>,
    /// `id` or `externalId`
    #[serde(default, rename = "sortBy")]
    pub sort_by: Option<String>,
    /// `ascending` (default) or `descending`
    #[serde(default, rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[async_trait]
impl ToolExecutor for ListScimUsers {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let query = ListQuery {
            filter: self.filter.clone(),
            attributes: self.attributes.clone(),
            start_index: self.start_index,
            count: self.count,
            sort_by: self.sort_by.clone(),
            sort_order: self
                .sort_order
                .as_deref()
                .map(SortOrder::from_param)
                .unwrap_or_default(),
        };
        let page = ctx.with_service(|service| service.list(&query))?;
        ToolOutput::json(&page)
    }
}

/// Get one user
#[scim_tool(
    name = "get_scim_user_by_id",
    description = "Get a SCIM user by id. Returns null when the user does not exist or does not match the filter",
    operation = "read"
)]
pub struct GetScimUserById {
    /// User id
    pub id: String,
    /// Comma-separated attributes to return
    #[serde(default)]
    pub attributes: Option<String>,
    /// SCIM filter the user must also match
    #[serde(default)]
    pub filter: Option<String>,
}

#[async_trait]
impl ToolExecutor for GetScimUserById {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let user = ctx.with_service(|service| {
            service.get(&self.id, self.attributes.as_deref(), self.filter.as_deref())
        })?;
        ToolOutput::json(&user)
    }
}

/// Create a user
#[scim_tool(
    name = "create_scim_user",
    description = "Create a SCIM user. The body needs userName (an email) and name.givenName/name.familyName",
    operation = "write"
)]
pub struct CreateScimUser {
    /// SCIM User resource
    pub body: Value,
    /// Comma-separated attributes to return
    #[serde(default)]
    pub attributes: Option<String>,
}

#[async_trait]
impl ToolExecutor for CreateScimUser {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let user =
            ctx.with_service(|service| service.create(&self.body, self.attributes.as_deref()))?;
        ToolOutput::json_value(user)
    }
}

/// PATCH a user
#[scim_tool(
    name = "update_scim_user_by_id",
    description = "Apply SCIM PatchOp operations (add, remove, replace) to a user. All operations succeed or none are applied",
    operation = "write"
)]
pub struct UpdateScimUserById {
    /// User id
    pub id: String,
    /// PatchOp body with `schemas` and `Operations`
    pub body: Value,
    /// Comma-separated attributes to return
    #[serde(default)]
    pub attributes: Option<String>,
}

#[async_trait]
impl ToolExecutor for UpdateScimUserById {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let user = ctx.with_service(|service| {
            service.patch(&self.id, &self.body, self.attributes.as_deref())
        })?;
        ToolOutput::json(&user)
    }
}

/// PUT a user
#[scim_tool(
    name = "replace_scim_user_by_id",
    description = "Replace the userName, name, externalId and active attributes of a user",
    operation = "write"
)]
pub struct ReplaceScimUserById {
    /// User id
    pub id: String,
    /// Replacement attributes
    pub body: Value,
    /// Comma-separated attributes to return
    #[serde(default)]
    pub attributes: Option<String>,
}

#[async_trait]
impl ToolExecutor for ReplaceScimUserById {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let user = ctx.with_service(|service| {
            service.put(&self.id, &self.body, self.attributes.as_deref())
        })?;
        ToolOutput::json(&user)
    }
}

/// Deactivate a user
#[scim_tool(
    name = "deactivate_scim_user_by_id",
    description = "Deactivate a user (sets active to false). Returns false when the user does not exist",
    operation = "delete"
)]
pub struct DeactivateScimUserById {
    /// User id
    pub id: String,
}

#[async_trait]
impl ToolExecutor for DeactivateScimUserById {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let deactivated = ctx.with_service(|service| service.delete(&self.id))?;
        ToolOutput::json(&deactivated)
    }
}

/// Register all user tools
pub fn register(registry: &mut crate::tools::ToolRegistry) {
    registry.register::<ListScimUsers>();
    registry.register::<GetScimUserById>();
    registry.register::<CreateScimUser>();
    registry.register::<UpdateScimUserById>();
    registry.register::<ReplaceScimUserById>();
    registry.register::<DeactivateScimUserById>();
}
