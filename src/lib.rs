//! Toolsmith - data tools for AI agents
//!
//! A registry of small generate/validate tools (UUIDs, IBANs, ISBNs, ship
//! identifiers, timestamps, random values) served over MCP as JSON-RPC 2.0
//! on stdio, or called one-shot from the command line.

pub mod capabilities;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod tools;

pub use config::{LogFormat, ServerArgs, ServerConfig};
pub use dispatch::Dispatcher;
pub use error::{Result, ToolsmithError};
pub use tools::{Tool, ToolContext, ToolFilter, ToolRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
