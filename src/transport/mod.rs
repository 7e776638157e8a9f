//! Transport module
//!
//! The server speaks MCP over stdio only.

pub mod stdio;

pub use stdio::run_stdio;
