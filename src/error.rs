//! Error types for Toolsmith

use serde_json::{json, Value};
use thiserror::Error;

use crate::tools::schema::ValidationError;

/// Result type alias for Toolsmith operations
pub type Result<T> = std::result::Result<T, ToolsmithError>;

/// JSON-RPC 2.0 error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Start of the server-defined range, used for tool execution failures
    pub const EXECUTION_ERROR: i64 = -32000;
}

/// Main error type for Toolsmith
#[derive(Error, Debug)]
pub enum ToolsmithError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Tool not found: {name}")]
    ToolNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Invalid params: {0}")]
    InvalidParams(#[from] ValidationError),

    #[error("Tool execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolsmithError {
    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self {
            ToolsmithError::Parse(_) => codes::PARSE_ERROR,
            ToolsmithError::InvalidRequest(_) => codes::INVALID_REQUEST,
            ToolsmithError::MethodNotFound(_) | ToolsmithError::ToolNotFound { .. } => {
                codes::METHOD_NOT_FOUND
            }
            ToolsmithError::InvalidParams(_) => codes::INVALID_PARAMS,
            ToolsmithError::Execution(_) => codes::EXECUTION_ERROR,
            _ => codes::INTERNAL_ERROR,
        }
    }

    /// Structured payload for the JSON-RPC `data` member
    pub fn data(&self) -> Option<Value> {
        match self {
            ToolsmithError::ToolNotFound { name, suggestions } => Some(json!({
                "tool": name,
                "suggestions": suggestions,
            })),
            ToolsmithError::InvalidParams(err) => serde_json::to_value(err).ok(),
            ToolsmithError::Execution(err) => Some(json!({ "kind": err.kind() })),
            _ => None,
        }
    }
}

/// Semantic failure raised by a tool after its params passed shape validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExecutionError {
    /// Stable identifier exposed to clients instead of internal details
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::InvalidInput(_) => "invalid_input",
            ExecutionError::Unsupported(_) => "unsupported",
            ExecutionError::Internal(_) => "internal",
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ExecutionError::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_json_rpc() {
        assert_eq!(ToolsmithError::Parse("x".into()).code(), -32700);
        assert_eq!(ToolsmithError::InvalidRequest("x".into()).code(), -32600);
        assert_eq!(ToolsmithError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(
            ToolsmithError::ToolNotFound {
                name: "x".into(),
                suggestions: vec![]
            }
            .code(),
            -32601
        );
        assert_eq!(
            ToolsmithError::InvalidParams(ValidationError::MissingParameter {
                field: "message".into()
            })
            .code(),
            -32602
        );
        assert_eq!(
            ToolsmithError::Execution(ExecutionError::invalid_input("bad date")).code(),
            -32000
        );
        assert_eq!(ToolsmithError::Config("x".into()).code(), -32603);
    }

    #[test]
    fn test_invalid_params_data_is_structured() {
        let err = ToolsmithError::InvalidParams(ValidationError::MissingParameter {
            field: "message".into(),
        });
        assert_eq!(
            err.data(),
            Some(json!({"kind": "missing_parameter", "field": "message"}))
        );
    }

    #[test]
    fn test_execution_data_only_exposes_kind() {
        let err = ToolsmithError::Execution(ExecutionError::Internal("stack frame 0x1".into()));
        assert_eq!(err.data(), Some(json!({"kind": "internal"})));
    }
}
