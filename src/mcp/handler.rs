//! Method table of the Toolsmith MCP server

use std::sync::Arc;

use serde_json::{json, Value};

use super::protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, ToolCallResult,
    ToolDefinition,
};
use crate::dispatch::Dispatcher;
use crate::error::{Result, ToolsmithError};
use crate::tools::schema::{json_type_name, ValidationError};
use crate::tools::ToolRegistry;

/// Serves MCP methods over a tool registry
pub struct ToolsmithHandler {
    dispatcher: Dispatcher,
    server_name: String,
}

impl ToolsmithHandler {
    pub fn new(registry: Arc<ToolRegistry>, server_name: impl Into<String>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            server_name: server_name.into(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Descriptors of the enabled tools, in registration order
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.dispatcher
            .registry()
            .list()
            .iter()
            .map(|tool| tool.definition())
            .collect()
    }

    fn route(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            methods::INITIALIZE => {
                let requested = params.get("protocolVersion").and_then(Value::as_str);
                let result = InitializeResult::negotiate(requested, &self.server_name);
                tracing::info!(
                    protocol_version = %result.protocol_version,
                    client = ?params.get("clientInfo"),
                    "initialize"
                );
                Ok(serde_json::to_value(result)?)
            }
            // Notification, no response is written
            methods::INITIALIZED => Ok(json!({})),
            methods::PING => Ok(json!({})),
            methods::LIST_TOOLS => Ok(json!({ "tools": self.tool_definitions() })),
            methods::CALL_TOOL => self.call_tool(params),
            other => Err(ToolsmithError::MethodNotFound(other.to_string())),
        }
    }

    fn call_tool(&self, params: Value) -> Result<Value> {
        let name = match params.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(ValidationError::TypeMismatch {
                    field: "name".to_string(),
                    expected: "string".to_string(),
                    actual: json_type_name(other),
                }
                .into())
            }
            None => {
                return Err(ValidationError::MissingParameter {
                    field: "name".to_string(),
                }
                .into())
            }
        };
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(arguments) => arguments.clone(),
        };

        let output = self.dispatcher.dispatch(&name, arguments)?;
        Ok(serde_json::to_value(ToolCallResult::json(&output)?)?)
    }
}

impl McpHandler for ToolsmithHandler {
    fn handle_request(&self, request: McpRequest) -> McpResponse {
        let id = request.response_id();
        match self.route(&request.method, request.params) {
            Ok(result) => McpResponse::success(id, result),
            Err(err) => {
                tracing::debug!(method = %request.method, code = err.code(), error = %err, "request failed");
                McpResponse::from_error(id, &err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{default_registry, test_support, ToolFilter};
    use pretty_assertions::assert_eq;

    fn handler(filter: &ToolFilter) -> ToolsmithHandler {
        let registry = default_registry(&test_support::context(), filter).unwrap();
        ToolsmithHandler::new(Arc::new(registry), "toolsmith")
    }

    fn request(id: Value, method: &str, params: Value) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn test_initialize_reports_server_info() {
        let resp = handler(&ToolFilter::all()).handle_request(request(
            json!(1),
            "initialize",
            json!({"protocolVersion": "2024-11-05", "clientInfo": {"name": "t"}}),
        ));
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "toolsmith");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[test]
    fn test_ping() {
        let resp = handler(&ToolFilter::all()).handle_request(request(json!("p"), "ping", json!({})));
        assert_eq!(resp.result, Some(json!({})));
        assert_eq!(resp.id, json!("p"));
    }

    #[test]
    fn test_list_respects_filter() {
        let filter = ToolFilter::from_lists(Some("echo,time,uuid"), Some("time"));
        let resp = handler(&filter).handle_request(request(json!(1), "tools/list", json!({})));
        let names: Vec<_> = resp.result.unwrap()["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["echo", "uuid"]);
    }

    #[test]
    fn test_call_wraps_compact_json() {
        let resp = handler(&ToolFilter::all()).handle_request(request(
            json!(1),
            "tools/call",
            json!({"name": "echo", "arguments": {"message": "Hello, MCP!"}}),
        ));
        assert_eq!(
            resp.result.unwrap(),
            json!({"content": [{"type": "text", "text": "{\"result\":\"Hello, MCP!\"}"}]})
        );
    }

    #[test]
    fn test_call_without_name() {
        let resp = handler(&ToolFilter::all()).handle_request(request(
            json!(2),
            "tools/call",
            json!({"arguments": {}}),
        ));
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(
            error.data,
            Some(json!({"kind": "missing_parameter", "field": "name"}))
        );
    }

    #[test]
    fn test_call_disabled_tool_is_not_found() {
        let filter = ToolFilter::from_lists(None, Some("echo"));
        let resp = handler(&filter).handle_request(request(
            json!(3),
            "tools/call",
            json!({"name": "echo", "arguments": {"message": "x"}}),
        ));
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[test]
    fn test_unknown_method() {
        let resp =
            handler(&ToolFilter::all()).handle_request(request(json!(9), "resources/list", json!({})));
        assert_eq!(resp.id, json!(9));
        assert_eq!(resp.error.unwrap().code, -32601);
    }
}
