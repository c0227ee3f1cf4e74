//! MCP JSON-RPC protocol implementation

use std::cell::Cell;
use std::io::{BufRead, BufReader, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ToolsmithError};
use crate::tools::schema::json_type_name;

/// Protocol revisions this server speaks, oldest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Newest entry of [`SUPPORTED_PROTOCOL_VERSIONS`]
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// MCP JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Envelope that failed validation, with whatever id could be recovered
#[derive(Debug)]
pub struct RejectedRequest {
    pub id: Value,
    pub error: ToolsmithError,
}

impl McpRequest {
    /// Validate a decoded JSON value as a request envelope
    ///
    /// Absent params become `{}`. The id must be a string, a number or null.
    pub fn from_value(value: Value) -> std::result::Result<Self, RejectedRequest> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(RejectedRequest {
                    id: Value::Null,
                    error: ToolsmithError::InvalidRequest(format!(
                        "expected a request object, got {}",
                        json_type_name(&other)
                    )),
                })
            }
        };

        let id = obj.remove("id");
        let recovered = match &id {
            Some(v @ (Value::String(_) | Value::Number(_))) => v.clone(),
            _ => Value::Null,
        };
        let reject = |message: String| RejectedRequest {
            id: recovered.clone(),
            error: ToolsmithError::InvalidRequest(message),
        };

        if let Some(other @ (Value::Bool(_) | Value::Array(_) | Value::Object(_))) = &id {
            return Err(reject(format!(
                "id must be a string, number or null, got {}",
                json_type_name(other)
            )));
        }
        match obj.get("jsonrpc") {
            Some(Value::String(v)) if v == "2.0" => {}
            _ => return Err(reject("jsonrpc must be \"2.0\"".to_string())),
        }
        let method = match obj.remove("method") {
            Some(Value::String(method)) => method,
            Some(other) => {
                return Err(reject(format!(
                    "method must be a string, got {}",
                    json_type_name(&other)
                )))
            }
            None => return Err(reject("missing method".to_string())),
        };
        let params = match obj.remove("params") {
            None => Value::Object(Map::new()),
            Some(params @ Value::Object(_)) => params,
            Some(other) => {
                return Err(reject(format!(
                    "params must be an object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        Ok(Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        })
    }

    /// Requests without an id (or with a null id) get no reply
    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(Value::Null))
    }

    /// Id to echo in the response
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// MCP JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create error from ToolsmithError, carrying its structured data
    pub fn from_error(id: Value, err: &ToolsmithError) -> Self {
        let mut response = Self::error(id, err.code(), err.to_string());
        if let Some(ref mut error) = response.error {
            error.data = err.data();
        }
        response
    }
}

/// Where the client is in the MCP handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// `initialize` answered, waiting for `notifications/initialized`
    Initialized,
    Serving,
}

impl SessionState {
    fn advance(self, method: &str) -> Self {
        match (self, method) {
            (_, methods::INITIALIZE) => SessionState::Initialized,
            (SessionState::Initialized, methods::INITIALIZED) => SessionState::Serving,
            (SessionState::Uninitialized, other) => {
                tracing::debug!(method = other, "request before initialize, serving anyway");
                SessionState::Serving
            }
            (state, _) => state,
        }
    }
}

/// MCP Server handling stdio communication
pub struct McpServer<H>
where
    H: McpHandler,
{
    handler: H,
    state: Cell<SessionState>,
}

/// Trait for handling MCP requests
pub trait McpHandler: Send + Sync {
    fn handle_request(&self, request: McpRequest) -> McpResponse;
}

impl<H: McpHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            state: Cell::new(SessionState::Uninitialized),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Run the server, reading from stdin and writing to stdout
    pub fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve(BufReader::new(stdin.lock()), stdout.lock())
    }

    /// Serve newline-delimited requests until end of input
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<()> {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                tracing::info!("input closed, shutting down");
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(trimmed) {
                let response_json = serde_json::to_string(&response)?;
                writeln!(writer, "{}", response_json)?;
                writer.flush()?;
            }
        }

        Ok(())
    }

    /// Process one line; `None` when nothing should be written back
    pub fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            // A broken object is most likely a request the client is waiting on
            Err(e) if line.starts_with('{') => {
                tracing::warn!(error = %e, "malformed request object");
                let error = ToolsmithError::Parse(e.to_string());
                return Some(McpResponse::from_error(Value::Null, &error));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparsable line");
                return None;
            }
        };

        let request = match McpRequest::from_value(value) {
            Ok(request) => request,
            Err(rejected) => {
                tracing::warn!(error = %rejected.error, "invalid request envelope");
                return Some(McpResponse::from_error(rejected.id, &rejected.error));
            }
        };

        let previous = self.state.get();
        let next = previous.advance(&request.method);
        if next != previous {
            tracing::info!(from = ?previous, to = ?next, "session state changed");
            self.state.set(next);
        }

        let notification = request.is_notification();
        tracing::debug!(method = %request.method, notification, "handling request");
        let response = self.handler.handle_request(request);
        if notification {
            None
        } else {
            Some(response)
        }
    }
}

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
}

/// MCP tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

/// MCP initialize result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl InitializeResult {
    /// Answer a client that asked for `requested`
    ///
    /// Supported revisions are echoed back; anything else gets the latest.
    pub fn negotiate(requested: Option<&str>, server_name: &str) -> Self {
        let protocol_version = requested
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(LATEST_PROTOCOL_VERSION);
        Self {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: server_name.to_string(),
                version: crate::VERSION.to_string(),
            },
        }
    }
}

/// Tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Single text item holding the compact JSON of `value`
    pub fn json(value: &impl Serialize) -> Result<Self> {
        Ok(Self::text(serde_json::to_string(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Echoes the method name back; errors on "fail"
    struct EchoMethod;

    impl McpHandler for EchoMethod {
        fn handle_request(&self, request: McpRequest) -> McpResponse {
            let id = request.response_id();
            if request.method == "fail" {
                return McpResponse::from_error(
                    id,
                    &ToolsmithError::MethodNotFound(request.method),
                );
            }
            McpResponse::success(id, json!({"method": request.method}))
        }
    }

    fn serve(input: &[u8]) -> Vec<Value> {
        let server = McpServer::new(EchoMethod);
        let mut out = Vec::new();
        server.serve(input, &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_envelope_defaults_params() {
        let req = McpRequest::from_value(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
            .unwrap();
        assert_eq!(req.params, json!({}));
        assert!(!req.is_notification());
    }

    #[test]
    fn test_envelope_rejections_keep_id() {
        let cases = [
            (json!({"jsonrpc": "1.0", "id": 3, "method": "ping"}), json!(3)),
            (json!({"jsonrpc": "2.0", "id": "a", "method": 5}), json!("a")),
            (json!({"jsonrpc": "2.0", "id": "b"}), json!("b")),
            (json!({"jsonrpc": "2.0", "id": 4, "method": "x", "params": [1]}), json!(4)),
            (json!({"jsonrpc": "2.0", "id": {"x": 1}, "method": "x"}), Value::Null),
            (json!([{"jsonrpc": "2.0", "id": 1, "method": "ping"}]), Value::Null),
            (json!(42), Value::Null),
        ];
        for (value, expected_id) in cases {
            let rejected = McpRequest::from_value(value).unwrap_err();
            assert_eq!(rejected.id, expected_id);
            assert_eq!(rejected.error.code(), -32600);
        }
    }

    #[test]
    fn test_null_id_is_notification() {
        let req =
            McpRequest::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "x"})).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_response_always_serializes_id() {
        let resp = McpResponse::error(Value::Null, -32600, "bad".into());
        let text = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            text,
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32600,"message":"bad"}}"#
        );
    }

    #[test]
    fn test_serve_skips_garbage_and_notifications() {
        let input = b"not json\n\n{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\
{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n";
        let responses = serve(input);
        assert_eq!(responses, vec![json!({"jsonrpc": "2.0", "id": 7, "result": {"method": "ping"}})]);
    }

    #[test]
    fn test_serve_survives_invalid_utf8() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":\"x\",\"method\":\"fail\"}");
        let responses = serve(&input);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], "x");
        assert_eq!(responses[0]["error"]["code"], -32601);
    }

    #[test]
    fn test_malformed_object_gets_parse_error() {
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"ping\",}\n\
{\"jsonrpc\":\"2.0\",\"id\":6,\"method\":\"ping\"}\n";
        let responses = serve(input);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 6);
    }

    #[test]
    fn test_out_of_range_ids_echo_exactly() {
        let server = McpServer::new(EchoMethod);
        for id in ["18446744073709551617", "-9223372036854775809", "12345678901234567890123", "0.1"] {
            let line = format!(r#"{{"jsonrpc":"2.0","id":{},"method":"ping"}}"#, id);
            let response = server.handle_line(&line).unwrap();
            let text = serde_json::to_string(&response).unwrap();
            assert!(text.contains(&format!(r#""id":{},"#, id)), "{}", text);
        }
    }

    #[test]
    fn test_session_state_transitions() {
        let server = McpServer::new(EchoMethod);
        assert_eq!(server.state(), SessionState::Uninitialized);
        server.handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#);
        assert_eq!(server.state(), SessionState::Initialized);
        server.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        assert_eq!(server.state(), SessionState::Serving);

        let lazy = McpServer::new(EchoMethod);
        assert!(lazy.handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).is_some());
        assert_eq!(lazy.state(), SessionState::Serving);
    }

    #[test]
    fn test_negotiate_protocol_version() {
        assert_eq!(
            InitializeResult::negotiate(Some("2025-03-26"), "t").protocol_version,
            "2025-03-26"
        );
        assert_eq!(
            InitializeResult::negotiate(Some("1999-01-01"), "t").protocol_version,
            LATEST_PROTOCOL_VERSION
        );
        assert_eq!(
            InitializeResult::negotiate(None, "t").protocol_version,
            LATEST_PROTOCOL_VERSION
        );
        assert_eq!(
            SUPPORTED_PROTOCOL_VERSIONS.last().copied(),
            Some(LATEST_PROTOCOL_VERSION)
        );
    }
}
