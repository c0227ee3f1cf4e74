//! Built-in tools and the contract they implement
//!
//! Every tool declares a typed input struct together with an [`ObjectSchema`];
//! the schema is what `tools/list` advertises and what the dispatcher validates
//! against, and the typed struct is what the tool body works with.

pub mod checksum;
pub mod credit_card;
pub mod ean13;
pub mod echo;
pub mod iban;
pub mod imo;
pub mod isbn;
pub mod mmsi;
pub mod random;
pub mod registry;
pub mod schema;
pub mod time;
pub mod uuid_gen;
pub mod version;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::capabilities::{Clock, Entropy, SystemClock};
use crate::error::ExecutionError;
use crate::mcp::protocol::ToolDefinition;

pub use registry::{ToolFilter, ToolRegistry, ToolRegistryBuilder};
pub use schema::{ObjectSchema, Param, ParamType, ValidationError};

/// Capability contract shared by every tool
pub trait Tool: Send + Sync {
    /// Unique, stable identifier
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn input_schema(&self) -> ObjectSchema;

    fn output_schema(&self) -> ObjectSchema;

    /// Shape check against [`Tool::input_schema`]; never executes anything
    fn validate_params(&self, params: &Value) -> Result<(), ValidationError> {
        self.input_schema().validate(params)
    }

    /// Run the tool on params that already passed [`Tool::validate_params`]
    fn execute(&self, params: Value) -> Result<Value, ExecutionError>;

    /// Descriptor advertised through `tools/list`
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema().to_json(),
            output_schema: Some(self.output_schema().to_json()),
        }
    }
}

/// Tool with a typed input and output
///
/// Implementors get [`Tool`] for free: params are deserialized into `Input`
/// after validation and `Output` is serialized back into JSON.
pub trait TypedTool: Send + Sync {
    type Input: DeserializeOwned;
    type Output: Serialize;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn params_schema(&self) -> ObjectSchema;

    fn result_schema(&self) -> ObjectSchema;

    fn run(&self, input: Self::Input) -> Result<Self::Output, ExecutionError>;
}

impl<T: TypedTool> Tool for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn description(&self) -> &'static str {
        T::DESCRIPTION
    }

    fn input_schema(&self) -> ObjectSchema {
        self.params_schema()
    }

    fn output_schema(&self) -> ObjectSchema {
        self.result_schema()
    }

    fn execute(&self, params: Value) -> Result<Value, ExecutionError> {
        let input: T::Input = serde_json::from_value(params).map_err(|e| {
            ExecutionError::Internal(format!(
                "arguments for '{}' do not match its schema: {}",
                T::NAME,
                e
            ))
        })?;
        let output = self.run(input)?;
        serde_json::to_value(output)
            .map_err(|e| ExecutionError::Internal(format!("unserializable result: {}", e)))
    }
}

/// Dependencies shared by the built-in tools
#[derive(Clone)]
pub struct ToolContext {
    pub clock: Arc<dyn Clock>,
    pub entropy: Arc<Entropy>,
    pub server_name: String,
}

impl ToolContext {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            entropy: Arc::new(Entropy::from_os()),
            server_name: server_name.into(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_entropy(mut self, entropy: Arc<Entropy>) -> Self {
        self.entropy = entropy;
        self
    }
}

/// All built-in tools, in registration order
pub fn builtin_tools(ctx: &ToolContext) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(echo::EchoTool),
        Arc::new(version::VersionTool::new(ctx.server_name.clone())),
        Arc::new(uuid_gen::UuidTool::new(ctx.clock.clone(), ctx.entropy.clone())),
        Arc::new(credit_card::CreditCardTool::new(ctx.entropy.clone())),
        Arc::new(isbn::IsbnTool::new(ctx.entropy.clone())),
        Arc::new(ean13::Ean13Tool::new(ctx.entropy.clone())),
        Arc::new(iban::IbanTool::new(ctx.entropy.clone())),
        Arc::new(imo::ImoTool::new(ctx.entropy.clone())),
        Arc::new(mmsi::MmsiTool::new(ctx.entropy.clone())),
        Arc::new(time::TimeTool::new(ctx.clock.clone())),
        Arc::new(random::RandomTool::new(ctx.entropy.clone())),
    ]
}

/// Register every built-in tool and freeze the registry with `filter`
pub fn default_registry(ctx: &ToolContext, filter: &ToolFilter) -> crate::Result<ToolRegistry> {
    let mut builder = ToolRegistry::builder();
    for tool in builtin_tools(ctx) {
        builder.register(tool)?;
    }
    Ok(builder.build(filter))
}

// ---------------------------------------------------------------------------
// Shared pieces for the generate/validate identifier tools
// ---------------------------------------------------------------------------

/// What an identifier tool is asked to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Generate,
    Validate,
}

impl Action {
    pub const CHOICES: &'static [&'static str] = &["generate", "validate"];
}

pub(crate) fn action_param() -> Param {
    Param::string("action", "Generate new values or validate an existing one")
        .one_of(Action::CHOICES)
        .default_value(json!("generate"))
}

pub(crate) fn count_param() -> Param {
    Param::integer("count", "Number of values to generate")
        .range(1.0, MAX_COUNT as f64)
        .default_value(json!(1))
}

pub(crate) fn value_param(description: &'static str) -> Param {
    Param::string("value", description).length(1, 256)
}

/// Upper bound for `count` on every generator
pub const MAX_COUNT: usize = 100;

pub(crate) fn default_count() -> usize {
    1
}

/// The `value` param is only mandatory for validation
pub(crate) fn require_value(tool: &str, value: Option<String>) -> Result<String, ExecutionError> {
    value.ok_or_else(|| {
        ExecutionError::invalid_input(format!("'{}' validation requires a 'value'", tool))
    })
}

/// Verdict returned by `action: validate`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Verdict {
    pub valid: bool,
    pub normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    pub fn valid(normalized: impl Into<String>) -> Self {
        Self {
            valid: true,
            normalized: normalized.into(),
            reason: None,
        }
    }

    pub fn invalid(normalized: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            normalized: normalized.into(),
            reason: Some(reason.into()),
        }
    }
}

/// Output schema fields common to the identifier tools
pub(crate) fn identifier_result_schema() -> ObjectSchema {
    ObjectSchema::new()
        .param(Param::array(
            "values",
            ParamType::String,
            "Generated values (generate)",
        ))
        .param(Param::boolean("valid", "Whether the value is valid (validate)"))
        .param(Param::string(
            "normalized",
            "Value with separators removed (validate)",
        ))
        .param(Param::string("reason", "Why the value is invalid (validate)"))
}
