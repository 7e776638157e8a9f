//! Business rule hooks
//!
//! Hooks inspect a proposed change before it is committed to the working
//! copy. They run in registration order and the first one to object aborts
//! the whole request.

use crate::error::Forbidden;
use serde_json::{Map, Value};
use tracing::debug;

/// A proposed modification of a user resource
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    /// Resource before the change
    pub before: &'a Map<String, Value>,
    /// Resource with the change applied
    pub after: &'a Map<String, Value>,
    /// Top-level attributes the change writes to
    pub touched: &'a [String],
}

impl Change<'_> {
    pub fn touches(&self, attribute: &str) -> bool {
        self.touched.iter().any(|t| t == attribute)
    }
}

pub trait Hook: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the violated rule, if any
    fn check(&self, change: &Change<'_>) -> Option<Forbidden>;
}

/// Users may not deactivate their own account.
///
/// In this simulation the acting principal always owns the resource, so any
/// write that leaves `active` set to `false` is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfDeactivationHook;

impl Hook for SelfDeactivationHook {
    fn name(&self) -> &'static str {
        "self_deactivation"
    }

    fn check(&self, change: &Change<'_>) -> Option<Forbidden> {
        let deactivated = change.after.get("active") == Some(&Value::Bool(false));
        (change.touches("active") && deactivated).then_some(Forbidden::SelfDeactivation)
    }
}

/// The email domain of `userName` is owned by the SSO configuration and
/// cannot be changed through the user API.
#[derive(Debug, Default, Clone, Copy)]
pub struct SsoDomainHook;

impl Hook for SsoDomainHook {
    fn name(&self) -> &'static str {
        "sso_domain"
    }

    fn check(&self, change: &Change<'_>) -> Option<Forbidden> {
        if !change.touches("userName") {
            return None;
        }
        let from = user_name_domain(change.before)?;
        let to = user_name_domain(change.after)?;
        (from != to).then_some(Forbidden::DomainChange { from, to })
    }
}

/// Lowercased domain part of the `userName` email, if it has one
fn user_name_domain(resource: &Map<String, Value>) -> Option<String> {
    let user_name = resource.get("userName")?.as_str()?;
    let (_, domain) = user_name.rsplit_once('@')?;
    Some(domain.to_lowercase())
}

/// Ordered list of hooks
pub struct HookChain {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookChain {
    /// No business rules
    pub fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Self-deactivation, then SSO domain
    pub fn standard() -> Self {
        Self::from_flags(true, true)
    }

    pub fn from_flags(self_deactivation: bool, sso_domain: bool) -> Self {
        let mut chain = Self::empty();
        if self_deactivation {
            chain = chain.with(SelfDeactivationHook);
        }
        if sso_domain {
            chain = chain.with(SsoDomainHook);
        }
        chain
    }

    pub fn with(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Run every hook in order, stopping at the first violation
    pub fn check(&self, change: &Change<'_>) -> Result<(), Forbidden> {
        for hook in &self.hooks {
            if let Some(violation) = hook.check(change) {
                debug!(hook = hook.name(), %violation, "Business rule rejected change");
                return Err(violation);
            }
        }
        Ok(())
    }
}

impl Default for HookChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.names())
            .finish()
    }
}
