//! SCIM filter expressions
//!
//! A subset of RFC 7644 §3.4.2.2: attribute comparisons, presence tests and
//! the `and` / `or` / `not` combinators with parenthesized grouping. Complex
//! attribute sub-filters (`roles[type eq "x"]`) are not supported.

mod ast;
mod evaluator;
mod lexer;
mod parser;

pub use ast::{FilterNode, Operator};
pub use evaluator::{compare_values, evaluate};
pub use parser::{MAX_NESTING_DEPTH, parse};

use crate::error::ScimResult;
use serde_json::Value;

/// Parse `filter` once and keep the resources that satisfy it
pub fn apply<'a, I>(filter: &str, resources: I) -> ScimResult<Vec<&'a Value>>
where
    I: IntoIterator<Item = &'a Value>,
{
    let node = parse(filter)?;
    Ok(resources
        .into_iter()
        .filter(|resource| evaluate(&node, resource))
        .collect())
}
