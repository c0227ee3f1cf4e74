//! EAN-13 barcodes

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::checksum::{gtin_check_digit, gtin_valid, is_all_digits, random_digits, strip_separators};
use super::{
    action_param, count_param, default_count, identifier_result_schema, require_value,
    value_param, Action, ObjectSchema, Param, TypedTool, Verdict,
};
use crate::capabilities::Entropy;
use crate::error::ExecutionError;

const PAYLOAD_LEN: usize = 12;

pub fn check(value: &str) -> Verdict {
    let normalized = strip_separators(value);
    if !is_all_digits(&normalized) {
        return Verdict::invalid(normalized, "EAN-13 contains only digits");
    }
    if normalized.len() != PAYLOAD_LEN + 1 {
        return Verdict::invalid(normalized, "EAN-13 has exactly 13 digits");
    }
    if !gtin_valid(&normalized) {
        return Verdict::invalid(normalized, "EAN-13 check digit mismatch");
    }
    Verdict::valid(normalized)
}

/// Generates or validates EAN-13 codes
pub struct Ean13Tool {
    entropy: Arc<Entropy>,
}

impl Ean13Tool {
    pub fn new(entropy: Arc<Entropy>) -> Self {
        Self { entropy }
    }

    fn generate(&self, prefix: &str) -> String {
        let mut payload = prefix.to_string();
        payload.push_str(&random_digits(&self.entropy, PAYLOAD_LEN - prefix.len()));
        let check = gtin_check_digit(&payload);
        format!("{}{}", payload, check)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ean13Input {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_count")]
    pub count: usize,
    pub value: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct Ean13Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(flatten)]
    pub verdict: Option<Verdict>,
}

impl TypedTool for Ean13Tool {
    type Input = Ean13Input;
    type Output = Ean13Output;

    const NAME: &'static str = "ean13";
    const DESCRIPTION: &'static str =
        "Generate EAN-13 barcode numbers (optionally under a GS1 prefix), or validate one.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(action_param())
            .param(
                Param::string("prefix", "Leading digits to keep, e.g. a GS1 country prefix")
                    .length(0, PAYLOAD_LEN),
            )
            .param(count_param())
            .param(value_param("EAN-13 to validate; spaces and hyphens are ignored"))
    }

    fn result_schema(&self) -> ObjectSchema {
        identifier_result_schema()
    }

    fn run(&self, input: Ean13Input) -> Result<Ean13Output, ExecutionError> {
        match input.action {
            Action::Generate => {
                if !input.prefix.is_empty() && !is_all_digits(&input.prefix) {
                    return Err(ExecutionError::invalid_input(
                        "EAN-13 prefix must contain only digits",
                    ));
                }
                Ok(Ean13Output {
                    values: Some(
                        (0..input.count)
                            .map(|_| self.generate(&input.prefix))
                            .collect(),
                    ),
                    ..Default::default()
                })
            }
            Action::Validate => {
                let value = require_value(Self::NAME, input.value)?;
                Ok(Ean13Output {
                    verdict: Some(check(&value)),
                    ..Default::default()
                })
            }
        }
    }
}
