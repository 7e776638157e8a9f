//! Access control for the SCIM user tools
//!
//! Every tool call is checked against the `[access_control]` section before
//! it reaches the user service. Rules are evaluated in this order, the first
//! match wins:
//!
//! 1. **Action override**: explicit `allow`/`deny` for one tool name
//! 2. **Allow patterns**: regex on the tool name, wins over deny patterns
//! 3. **Deny patterns**: regex on the tool name
//! 4. **Base level**: `full`, `read` (only read tools) or `deny`
//!
//! ## Example Configuration
//!
//! ```toml
//! [access_control]
//! all = "read"                          # Only list/get
//! deny = ["^deactivate_"]
//!
//! [access_control.actions]
//! update_scim_user_by_id = "allow"      # Still allow PATCH
//! ```

pub mod patterns;
pub mod resolver;
pub mod types;

pub use patterns::PatternMatcher;
pub use resolver::{AccessDecision, AccessResolver};
pub use types::{AccessControlled, OperationType};
