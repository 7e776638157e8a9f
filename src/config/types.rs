//! Configuration types for scim-sim
//!
//! Loaded from TOML files and/or `SCIM_SIM_*` environment variables.

use crate::scim::models::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::collections::HashMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// MCP server identity
    pub server: ServerConfig,

    /// User service settings
    pub scim: ScimConfig,

    /// Which tools may be called
    pub access_control: AccessControlConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// MCP server identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name reported to MCP clients
    pub name: String,

    /// Server version reported to MCP clients
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "scim-sim".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// User service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScimConfig {
    /// Base URL used to build `meta.location`
    pub base_url: String,

    /// JSON file with initial users
    pub seed_file: Option<String>,

    /// Reject changes that set `active` to false through PATCH or PUT
    pub enforce_self_deactivation: bool,

    /// Reject `userName` changes that move the user to another email domain
    pub enforce_sso_domain: bool,
}

impl Default for ScimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            seed_file: None,
            enforce_self_deactivation: true,
            enforce_sso_domain: true,
        }
    }
}

/// Access control configuration
///
/// `actions` overrides win over `allow` patterns, which win over `deny`
/// patterns, which win over the `all` level.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessControlConfig {
    /// Base access level for all tools
    pub all: AccessLevel,

    /// Deny patterns (regex on the tool name)
    pub deny: Vec<String>,

    /// Allow patterns (regex, override deny)
    pub allow: Vec<String>,

    /// Per-tool overrides
    pub actions: HashMap<String, ActionPermission>,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            all: AccessLevel::Full,
            deny: Vec::new(),
            allow: Vec::new(),
            actions: HashMap::new(),
        }
    }
}

/// Base access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Deny every tool
    Deny,
    /// Only list and get
    Read,
    /// Every tool
    #[default]
    Full,
}

/// Individual action permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPermission {
    Allow,
    Deny,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
