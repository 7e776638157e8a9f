//! SCIM user simulation server
//!
//! An in-memory SCIM 2.0 user store with the query and patch semantics of a
//! provisioning API, served as MCP tools.
//!
//! ## Features
//!
//! - **Filters**: `userName eq "a@b.com" and (active eq true or roles pr)`
//! - **Attribute selection**: `attributes=userName,name.givenName`
//! - **PATCH**: `add`, `remove` and `replace` operations applied atomically,
//!   checked against business rules (no self-deactivation, no SSO domain change)
//! - **Access control**: base level, regex deny/allow patterns and per-tool overrides
//!
//! ## Example Configuration
//!
//! ```toml
//! [scim]
//! base_url = "https://api.example.com/scim/v2"
//! seed_file = "~/users.json"
//!
//! [access_control]
//! all = "read"
//! allow = ["^update_scim_user_by_id$"]
//! ```

pub mod access_control;
pub mod clock;
pub mod config;
pub mod error;
pub mod scim;
pub mod server;
pub mod store;
pub mod tools;
pub mod transport;

pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use scim::UserService;
pub use server::ScimMcpHandler;
pub use store::{InMemoryStore, ResourceStore};
