//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio for AI tool integration.

pub mod handler;
pub mod protocol;

pub use handler::ToolsmithHandler;
pub use protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer, SessionState,
    ToolCallResult, ToolDefinition,
};
