//! Echo tool

use serde::{Deserialize, Serialize};

use super::{ObjectSchema, Param, TypedTool};
use crate::error::ExecutionError;

/// Returns its message unchanged
pub struct EchoTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EchoInput {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct EchoOutput {
    pub result: String,
}

impl TypedTool for EchoTool {
    type Input = EchoInput;
    type Output = EchoOutput;

    const NAME: &'static str = "echo";
    const DESCRIPTION: &'static str = "Echo a message back to the client.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new().param(Param::string("message", "The message to echo").required())
    }

    fn result_schema(&self) -> ObjectSchema {
        ObjectSchema::new().param(Param::string("result", "The echoed message").required())
    }

    fn run(&self, input: EchoInput) -> Result<EchoOutput, ExecutionError> {
        Ok(EchoOutput {
            result: input.message,
        })
    }
}
