//! Access control resolver
//!
//! Precedence, highest first: action override, allow patterns, deny
//! patterns, base level.

use crate::access_control::patterns::PatternMatcher;
use crate::access_control::types::OperationType;
use crate::config::{AccessControlConfig, AccessLevel, ActionPermission};
use crate::error::{AccessDeniedError, ConfigError};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Compiled `[access_control]` section
#[derive(Debug)]
pub struct AccessResolver {
    base_level: AccessLevel,
    deny: PatternMatcher,
    allow: PatternMatcher,
    actions: HashMap<String, ActionPermission>,
}

/// Result of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied(_))
    }
}

impl AccessResolver {
    pub fn new(config: &AccessControlConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_level: config.all,
            deny: PatternMatcher::new("access_control.deny", &config.deny)?,
            allow: PatternMatcher::new("access_control.allow", &config.allow)?,
            actions: config.actions.clone(),
        })
    }

    /// Resolver that allows every tool
    pub fn allow_all() -> Self {
        Self {
            base_level: AccessLevel::Full,
            deny: PatternMatcher::default(),
            allow: PatternMatcher::default(),
            actions: HashMap::new(),
        }
    }

    pub fn check(&self, tool_name: &str, operation: OperationType) -> AccessDecision {
        debug!(tool = tool_name, operation = %operation, "Checking access");

        if let Some(permission) = self.actions.get(tool_name) {
            trace!("Matched action override");
            return match permission {
                ActionPermission::Allow => AccessDecision::Allowed,
                ActionPermission::Deny => {
                    AccessDecision::Denied("explicitly denied by action override".to_string())
                }
            };
        }

        if let Some(pattern) = self.allow.find_match(tool_name) {
            trace!(pattern, "Matched allow pattern");
            return AccessDecision::Allowed;
        }
        if let Some(pattern) = self.deny.find_match(tool_name) {
            trace!(pattern, "Matched deny pattern");
            return AccessDecision::Denied(format!("denied by pattern '{}'", pattern));
        }

        trace!(level = ?self.base_level, "Using base level");
        match (self.base_level, operation) {
            (AccessLevel::Full, _) | (AccessLevel::Read, OperationType::Read) => {
                AccessDecision::Allowed
            }
            (AccessLevel::Read, _) => AccessDecision::Denied(format!(
                "operation '{}' is not permitted in read-only mode",
                operation
            )),
            (AccessLevel::Deny, _) => {
                AccessDecision::Denied("all tools are denied by configuration".to_string())
            }
        }
    }

    /// Like [`check`](Self::check) but as a `Result`
    pub fn require(
        &self,
        tool_name: &str,
        operation: OperationType,
    ) -> Result<(), AccessDeniedError> {
        match self.check(tool_name, operation) {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(reason) => Err(AccessDeniedError::new(tool_name, reason)),
        }
    }

    pub fn base_level(&self) -> AccessLevel {
        self.base_level
    }
}

impl Default for AccessResolver {
    fn default() -> Self {
        Self::allow_all()
    }
}
