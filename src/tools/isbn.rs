//! ISBN-10 and ISBN-13

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::checksum::{gtin_check_digit, gtin_valid, is_all_digits, random_digits, strip_separators};
use super::{
    action_param, count_param, default_count, identifier_result_schema, require_value,
    value_param, Action, ObjectSchema, Param, TypedTool, Verdict,
};
use crate::capabilities::Entropy;
use crate::error::ExecutionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IsbnFormat {
    Isbn10,
    #[default]
    Isbn13,
}

/// ISBN-10 check character for nine payload digits
pub fn isbn10_check_char(payload: &str) -> char {
    let sum: u32 = payload
        .chars()
        .filter_map(|c| c.to_digit(10))
        .zip((2..=10).rev())
        .map(|(d, w)| d * w)
        .sum();
    match (11 - sum % 11) % 11 {
        10 => 'X',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

/// Convert a valid ISBN-10 to its ISBN-13 form
pub fn isbn10_to_13(isbn10: &str) -> String {
    let payload = format!("978{}", &isbn10[..9]);
    let check = gtin_check_digit(&payload);
    format!("{}{}", payload, check)
}

/// Verdict and detected format for an ISBN
pub fn check(value: &str) -> (Verdict, Option<IsbnFormat>) {
    let normalized = strip_separators(value).to_uppercase();
    if !normalized.is_ascii() {
        return (Verdict::invalid(normalized, "ISBN contains only digits and X"), None);
    }
    match normalized.len() {
        10 => {
            let (payload, check) = normalized.split_at(9);
            if !is_all_digits(payload) || !(is_all_digits(check) || check == "X") {
                return (
                    Verdict::invalid(normalized, "ISBN-10 is nine digits and a digit or X"),
                    None,
                );
            }
            if isbn10_check_char(payload).to_string() != check {
                return (
                    Verdict::invalid(normalized, "ISBN-10 check digit mismatch"),
                    None,
                );
            }
            (Verdict::valid(normalized), Some(IsbnFormat::Isbn10))
        }
        13 => {
            if !is_all_digits(&normalized) {
                return (Verdict::invalid(normalized, "ISBN-13 contains only digits"), None);
            }
            if !(normalized.starts_with("978") || normalized.starts_with("979")) {
                return (
                    Verdict::invalid(normalized, "ISBN-13 starts with 978 or 979"),
                    None,
                );
            }
            if !gtin_valid(&normalized) {
                return (
                    Verdict::invalid(normalized, "ISBN-13 check digit mismatch"),
                    None,
                );
            }
            (Verdict::valid(normalized), Some(IsbnFormat::Isbn13))
        }
        _ => (
            Verdict::invalid(normalized, "ISBN has 10 or 13 characters"),
            None,
        ),
    }
}

/// Generates or validates ISBNs
pub struct IsbnTool {
    entropy: Arc<Entropy>,
}

impl IsbnTool {
    pub fn new(entropy: Arc<Entropy>) -> Self {
        Self { entropy }
    }

    fn generate(&self, format: IsbnFormat) -> String {
        match format {
            IsbnFormat::Isbn10 => {
                let payload = random_digits(&self.entropy, 9);
                let check = isbn10_check_char(&payload);
                format!("{}{}", payload, check)
            }
            IsbnFormat::Isbn13 => {
                let prefix = if self.entropy.with(|rng| rng.gen_bool(0.8)) {
                    "978"
                } else {
                    "979"
                };
                let payload = format!("{}{}", prefix, random_digits(&self.entropy, 9));
                let check = gtin_check_digit(&payload);
                format!("{}{}", payload, check)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IsbnInput {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub format: IsbnFormat,
    #[serde(default = "default_count")]
    pub count: usize,
    pub value: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct IsbnOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(flatten)]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<IsbnFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn13: Option<String>,
}

impl TypedTool for IsbnTool {
    type Input = IsbnInput;
    type Output = IsbnOutput;

    const NAME: &'static str = "isbn";
    const DESCRIPTION: &'static str =
        "Generate ISBN-10 or ISBN-13 book numbers, or validate one (ISBN-10 values are also converted to ISBN-13).";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(action_param())
            .param(
                Param::string("format", "ISBN format to generate")
                    .one_of(&["isbn10", "isbn13"])
                    .default_value(json!("isbn13")),
            )
            .param(count_param())
            .param(value_param("ISBN to validate; spaces and hyphens are ignored"))
    }

    fn result_schema(&self) -> ObjectSchema {
        identifier_result_schema()
            .param(Param::string("format", "Detected format").one_of(&["isbn10", "isbn13"]))
            .param(Param::string("isbn13", "ISBN-13 equivalent of a valid ISBN-10"))
    }

    fn run(&self, input: IsbnInput) -> Result<IsbnOutput, ExecutionError> {
        match input.action {
            Action::Generate => Ok(IsbnOutput {
                values: Some((0..input.count).map(|_| self.generate(input.format)).collect()),
                ..Default::default()
            }),
            Action::Validate => {
                let value = require_value(Self::NAME, input.value)?;
                let (verdict, format) = check(&value);
                let isbn13 = match format {
                    Some(IsbnFormat::Isbn10) => Some(isbn10_to_13(&verdict.normalized)),
                    _ => None,
                };
                Ok(IsbnOutput {
                    verdict: Some(verdict),
                    format,
                    isbn13,
                    ..Default::default()
                })
            }
        }
    }
}
