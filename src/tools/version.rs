//! Version tool

use serde::{Deserialize, Serialize};

use super::{ObjectSchema, Param, ParamType, TypedTool};
use crate::error::ExecutionError;
use crate::mcp::protocol::SUPPORTED_PROTOCOL_VERSIONS;

/// Reports the server name, crate version, and supported MCP revisions
pub struct VersionTool {
    server_name: String,
}

impl VersionTool {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionInput {}

#[derive(Debug, Serialize)]
pub struct VersionOutput {
    pub name: String,
    pub version: String,
    pub protocol_versions: Vec<String>,
}

impl TypedTool for VersionTool {
    type Input = VersionInput;
    type Output = VersionOutput;

    const NAME: &'static str = "version";
    const DESCRIPTION: &'static str = "Report the server name, version, and supported protocol versions.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
    }

    fn result_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(Param::string("name", "Server name").required())
            .param(Param::string("version", "Server version").required())
            .param(
                Param::array(
                    "protocol_versions",
                    ParamType::String,
                    "Supported MCP protocol revisions",
                )
                .required(),
            )
    }

    fn run(&self, _input: VersionInput) -> Result<VersionOutput, ExecutionError> {
        Ok(VersionOutput {
            name: self.server_name.clone(),
            version: crate::VERSION.to_string(),
            protocol_versions: SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{test_support, Tool};
    use serde_json::json;

    #[test]
    fn test_version_reports_crate_version() {
        let out = test_support::call(&VersionTool::new("toolsmith"), json!({})).unwrap();
        assert_eq!(out["name"], "toolsmith");
        assert_eq!(out["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_version_rejects_arguments() {
        assert!(VersionTool::new("x")
            .validate_params(&json!({"verbose": true}))
            .is_err());
    }
}
