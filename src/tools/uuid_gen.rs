//! UUID generation and validation

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::{Builder, Uuid, Variant};

use super::{
    action_param, count_param, default_count, require_value, value_param, Action, ObjectSchema,
    Param, ParamType, TypedTool,
};
use crate::capabilities::{Clock, Entropy};
use crate::error::ExecutionError;

/// Generates random (v4) or time-ordered (v7) UUIDs, or inspects one
pub struct UuidTool {
    clock: Arc<dyn Clock>,
    entropy: Arc<Entropy>,
}

impl UuidTool {
    pub fn new(clock: Arc<dyn Clock>, entropy: Arc<Entropy>) -> Self {
        Self { clock, entropy }
    }

    fn generate(&self, version: UuidVersion) -> Uuid {
        match version {
            UuidVersion::V4 => {
                let mut bytes = [0u8; 16];
                self.entropy.fill_bytes(&mut bytes);
                Builder::from_random_bytes(bytes).into_uuid()
            }
            UuidVersion::V7 => {
                let mut bytes = [0u8; 10];
                self.entropy.fill_bytes(&mut bytes);
                let millis = self.clock.now().timestamp_millis().max(0) as u64;
                Builder::from_unix_timestamp_millis(millis, &bytes).into_uuid()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidVersion {
    #[default]
    V4,
    V7,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidFormat {
    #[default]
    Hyphenated,
    Simple,
    Urn,
    Braced,
}

impl UuidFormat {
    fn render(self, uuid: Uuid) -> String {
        match self {
            UuidFormat::Hyphenated => uuid.hyphenated().to_string(),
            UuidFormat::Simple => uuid.simple().to_string(),
            UuidFormat::Urn => uuid.urn().to_string(),
            UuidFormat::Braced => uuid.braced().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UuidInput {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub version: UuidVersion,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub format: UuidFormat,
    #[serde(default)]
    pub uppercase: bool,
    pub value: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct UuidOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn variant_name(variant: Variant) -> &'static str {
    match variant {
        Variant::NCS => "ncs",
        Variant::RFC4122 => "rfc4122",
        Variant::Microsoft => "microsoft",
        _ => "future",
    }
}

impl TypedTool for UuidTool {
    type Input = UuidInput;
    type Output = UuidOutput;

    const NAME: &'static str = "uuid";
    const DESCRIPTION: &'static str =
        "Generate random (v4) or time-ordered (v7) UUIDs, or validate and inspect a UUID.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(action_param())
            .param(
                Param::string("version", "UUID version to generate")
                    .one_of(&["v4", "v7"])
                    .default_value(json!("v4")),
            )
            .param(count_param())
            .param(
                Param::string("format", "Textual representation")
                    .one_of(&["hyphenated", "simple", "urn", "braced"])
                    .default_value(json!("hyphenated")),
            )
            .param(
                Param::boolean("uppercase", "Render hex digits in uppercase")
                    .default_value(json!(false)),
            )
            .param(value_param("UUID to validate (any common representation)"))
    }

    fn result_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(Param::array("values", ParamType::String, "Generated UUIDs"))
            .param(Param::boolean("valid", "Whether the value parsed as a UUID"))
            .param(Param::string("normalized", "Hyphenated lowercase form"))
            .param(Param::integer("version", "Version number of the UUID"))
            .param(Param::string("variant", "Variant of the UUID"))
            .param(Param::string("reason", "Parse failure"))
    }

    fn run(&self, input: UuidInput) -> Result<UuidOutput, ExecutionError> {
        match input.action {
            Action::Generate => {
                let values = (0..input.count)
                    .map(|_| {
                        let text = input.format.render(self.generate(input.version));
                        if input.uppercase {
                            text.to_uppercase()
                        } else {
                            text
                        }
                    })
                    .collect();
                Ok(UuidOutput {
                    values: Some(values),
                    ..Default::default()
                })
            }
            Action::Validate => {
                let value = require_value(Self::NAME, input.value)?;
                match Uuid::parse_str(value.trim()) {
                    Ok(uuid) => Ok(UuidOutput {
                        valid: Some(true),
                        normalized: Some(uuid.hyphenated().to_string()),
                        version: Some(uuid.get_version_num()),
                        variant: Some(variant_name(uuid.get_variant()).to_string()),
                        ..Default::default()
                    }),
                    Err(e) => Ok(UuidOutput {
                        valid: Some(false),
                        reason: Some(e.to_string()),
                        ..Default::default()
                    }),
                }
            }
        }
    }
}
