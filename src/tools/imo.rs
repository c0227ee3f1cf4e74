//! IMO ship identification numbers

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::checksum::{is_all_digits, random_digits};
use super::{
    action_param, count_param, default_count, identifier_result_schema, require_value,
    value_param, Action, ObjectSchema, Param, TypedTool, Verdict,
};
use crate::capabilities::Entropy;
use crate::error::ExecutionError;

/// Check digit: the six leading digits weighted 7..2, last digit of the sum
pub fn imo_check_digit(payload: &str) -> u32 {
    let sum: u32 = payload
        .chars()
        .filter_map(|c| c.to_digit(10))
        .zip((2..=7).rev())
        .map(|(d, w)| d * w)
        .sum();
    sum % 10
}

pub fn check(value: &str) -> Verdict {
    let trimmed = value.trim();
    let digits = trimmed
        .get(..3)
        .filter(|p| p.eq_ignore_ascii_case("IMO"))
        .map_or(trimmed, |_| trimmed[3..].trim_start());
    let normalized = digits.to_string();

    if !is_all_digits(&normalized) || normalized.len() != 7 {
        return Verdict::invalid(normalized, "IMO numbers have exactly 7 digits");
    }
    let (payload, check) = normalized.split_at(6);
    if imo_check_digit(payload).to_string() != check {
        return Verdict::invalid(normalized, "IMO check digit mismatch");
    }
    Verdict::valid(normalized)
}

/// Generates or validates IMO numbers
pub struct ImoTool {
    entropy: Arc<Entropy>,
}

impl ImoTool {
    pub fn new(entropy: Arc<Entropy>) -> Self {
        Self { entropy }
    }

    fn generate(&self, with_prefix: bool) -> String {
        let lead = self.entropy.with(|rng| rng.gen_range(1..10u8));
        let payload = format!("{}{}", lead, random_digits(&self.entropy, 5));
        let number = format!("{}{}", payload, imo_check_digit(&payload));
        if with_prefix {
            format!("IMO {}", number)
        } else {
            number
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImoInput {
    #[serde(default)]
    pub action: Action,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_prefix")]
    pub prefix: bool,
    pub value: Option<String>,
}

fn default_prefix() -> bool {
    true
}

#[derive(Debug, Default, Serialize)]
pub struct ImoOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(flatten)]
    pub verdict: Option<Verdict>,
}

impl TypedTool for ImoTool {
    type Input = ImoInput;
    type Output = ImoOutput;

    const NAME: &'static str = "imo";
    const DESCRIPTION: &'static str =
        "Generate IMO ship identification numbers, or validate one (with or without the 'IMO' prefix).";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(action_param())
            .param(count_param())
            .param(
                Param::boolean("prefix", "Prefix generated numbers with 'IMO '")
                    .default_value(json!(true)),
            )
            .param(value_param("IMO number to validate"))
    }

    fn result_schema(&self) -> ObjectSchema {
        identifier_result_schema()
    }

    fn run(&self, input: ImoInput) -> Result<ImoOutput, ExecutionError> {
        match input.action {
            Action::Generate => Ok(ImoOutput {
                values: Some((0..input.count).map(|_| self.generate(input.prefix)).collect()),
                ..Default::default()
            }),
            Action::Validate => {
                let value = require_value(Self::NAME, input.value)?;
                Ok(ImoOutput {
                    verdict: Some(check(&value)),
                    ..Default::default()
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support;

    #[test]
    fn test_known_numbers() {
        assert!(check("IMO 9074729").valid);
        assert!(check("imo9074729").valid);
        assert!(check("9074729").valid);
        assert_eq!(
            check("IMO 9074728").reason.as_deref(),
            Some("IMO check digit mismatch")
        );
        assert!(!check("IMO 907472").valid);
    }

    #[test]
    fn test_generated_numbers_validate() {
        let tool = ImoTool::new(test_support::context().entropy);
        let out = test_support::call(&tool, json!({"count": 30})).unwrap();
        for value in out["values"].as_array().unwrap() {
            let number = value.as_str().unwrap();
            assert!(number.starts_with("IMO "));
            assert!(check(number).valid, "{} failed", number);
        }

        let out = test_support::call(&tool, json!({"prefix": false})).unwrap();
        assert_eq!(out["values"][0].as_str().unwrap().len(), 7);
    }
}
