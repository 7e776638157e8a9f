//! SCIM user query and patch engine
//!
//! - [`filter`]: filter expression parser and evaluator
//! - [`selector`]: `attributes` parameter parsing and projection
//! - [`patch`]: PATCH body validation and application
//! - [`hooks`]: business rules checked before each change is committed
//! - [`service`]: the user API on top of a resource store

pub mod filter;
pub mod hooks;
pub mod meta;
pub mod models;
pub mod patch;
pub mod path;
pub mod selector;
pub mod service;
pub mod value;

pub use filter::{FilterNode, Operator};
pub use hooks::{Change, Hook, HookChain, SelfDeactivationHook, SsoDomainHook};
pub use models::{CreateRequest, ListQuery, ListResponse, ReplaceRequest, SortOrder};
pub use patch::{PatchApplier, PatchOp, PatchOperation, PatchRequest};
pub use path::AttributePath;
pub use selector::{AttributeSelection, parse_selector, project};
pub use service::UserService;
