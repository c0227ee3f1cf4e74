//! Payment card numbers (test data only)

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::checksum::{is_all_digits, luhn_check_digit, luhn_valid, random_digits, strip_separators};
use super::{
    action_param, count_param, default_count, identifier_result_schema, require_value,
    value_param, Action, ObjectSchema, Param, TypedTool, Verdict,
};
use crate::capabilities::Entropy;
use crate::error::ExecutionError;

/// Card scheme, identified by its issuer prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    #[default]
    Visa,
    Mastercard,
    Amex,
    Discover,
    Jcb,
    Diners,
}

impl Brand {
    pub const CHOICES: &'static [&'static str] =
        &["visa", "mastercard", "amex", "discover", "jcb", "diners"];

    fn prefixes(self) -> &'static [&'static str] {
        match self {
            Brand::Visa => &["4"],
            Brand::Mastercard => &["51", "52", "53", "54", "55", "2221", "2720"],
            Brand::Amex => &["34", "37"],
            Brand::Discover => &["6011", "65", "644", "649"],
            Brand::Jcb => &["3528", "3589"],
            Brand::Diners => &["36", "38", "300", "305"],
        }
    }

    fn length(self) -> usize {
        match self {
            Brand::Amex => 15,
            Brand::Diners => 14,
            _ => 16,
        }
    }

    /// Detect the scheme from a digits-only number
    pub fn detect(number: &str) -> Option<Brand> {
        let prefix = |n: usize| number.get(..n).and_then(|p| p.parse::<u32>().ok());
        let len = number.len();

        if matches!(prefix(2), Some(34 | 37)) && len == 15 {
            return Some(Brand::Amex);
        }
        if (matches!(prefix(3), Some(300..=305)) || matches!(prefix(2), Some(36 | 38))) && len == 14
        {
            return Some(Brand::Diners);
        }
        if matches!(prefix(4), Some(3528..=3589)) && len == 16 {
            return Some(Brand::Jcb);
        }
        if number.starts_with('4') && matches!(len, 13 | 16 | 19) {
            return Some(Brand::Visa);
        }
        if (matches!(prefix(2), Some(51..=55)) || matches!(prefix(4), Some(2221..=2720)))
            && len == 16
        {
            return Some(Brand::Mastercard);
        }
        if (matches!(prefix(4), Some(6011))
            || matches!(prefix(2), Some(65))
            || matches!(prefix(3), Some(644..=649)))
            && (16..=19).contains(&len)
        {
            return Some(Brand::Discover);
        }
        None
    }
}

/// Generates Luhn-valid card numbers for a scheme, or validates one
pub struct CreditCardTool {
    entropy: Arc<Entropy>,
}

impl CreditCardTool {
    pub fn new(entropy: Arc<Entropy>) -> Self {
        Self { entropy }
    }

    fn generate(&self, brand: Brand) -> String {
        let prefix = self
            .entropy
            .with(|rng| brand.prefixes().choose(rng).copied())
            .unwrap_or("4");
        let mut payload = prefix.to_string();
        payload.push_str(&random_digits(
            &self.entropy,
            brand.length() - prefix.len() - 1,
        ));
        let check = luhn_check_digit(&payload);
        format!("{}{}", payload, check)
    }
}

/// Verdict for a card number
pub fn check(value: &str) -> (Verdict, Option<Brand>) {
    let normalized = strip_separators(value);
    if !is_all_digits(&normalized) {
        return (
            Verdict::invalid(normalized, "card numbers contain only digits"),
            None,
        );
    }
    if !(12..=19).contains(&normalized.len()) {
        return (
            Verdict::invalid(normalized, "card numbers have 12 to 19 digits"),
            None,
        );
    }
    if !luhn_valid(&normalized) {
        return (Verdict::invalid(normalized, "Luhn checksum mismatch"), None);
    }
    let brand = Brand::detect(&normalized);
    (Verdict::valid(normalized), brand)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreditCardInput {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub brand: Brand,
    #[serde(default = "default_count")]
    pub count: usize,
    pub value: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CreditCardOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(flatten)]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
}

impl TypedTool for CreditCardTool {
    type Input = CreditCardInput;
    type Output = CreditCardOutput;

    const NAME: &'static str = "credit-card";
    const DESCRIPTION: &'static str =
        "Generate Luhn-valid test card numbers for a card scheme, or validate a card number and detect its scheme.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(action_param())
            .param(
                Param::string("brand", "Card scheme to generate")
                    .one_of(Brand::CHOICES)
                    .default_value(json!("visa")),
            )
            .param(count_param())
            .param(value_param("Card number to validate; spaces and hyphens are ignored"))
    }

    fn result_schema(&self) -> ObjectSchema {
        identifier_result_schema().param(
            Param::string("brand", "Card scheme (generated or detected)").one_of(Brand::CHOICES),
        )
    }

    fn run(&self, input: CreditCardInput) -> Result<CreditCardOutput, ExecutionError> {
        match input.action {
            Action::Generate => Ok(CreditCardOutput {
                values: Some((0..input.count).map(|_| self.generate(input.brand)).collect()),
                brand: Some(input.brand),
                ..Default::default()
            }),
            Action::Validate => {
                let value = require_value(Self::NAME, input.value)?;
                let (verdict, brand) = check(&value);
                Ok(CreditCardOutput {
                    verdict: Some(verdict),
                    brand,
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

    fn tool() -> CreditCardTool {
        CreditCardTool::new(test_support::context().entropy)
    }

    #[test]
    fn test_generated_numbers_match_their_brand() {
        for brand in Brand::CHOICES {
            let out =
                test_support::call(&tool(), json!({"brand": brand, "count": 20})).unwrap();
            for value in out["values"].as_array().unwrap() {
                let number = value.as_str().unwrap();
                let (verdict, detected) = check(number);
                assert!(verdict.valid, "{} generated invalid {}", brand, number);
                assert_eq!(
                    serde_json::to_value(detected).unwrap(),
                    json!(brand),
                    "{} misdetected",
                    number
                );
            }
        }
    }

    #[test]
    fn test_validate_known_numbers() {
        let out = test_support::call(
            &tool(),
            json!({"action": "validate", "value": "4111 1111 1111 1111"}),
        )
        .unwrap();
        assert_eq!(out["valid"], true);
        assert_eq!(out["normalized"], "4111111111111111");
        assert_eq!(out["brand"], "visa");

        let out = test_support::call(
            &tool(),
            json!({"action": "validate", "value": "3782-822463-10005"}),
        )
        .unwrap();
        assert_eq!(out["brand"], "amex");
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        let (verdict, _) = check("4111111111111112");
        assert!(!verdict.valid);
        assert_eq!(verdict.reason.as_deref(), Some("Luhn checksum mismatch"));

        let (verdict, _) = check("4111-abcd");
        assert!(!verdict.valid);

        let (verdict, _) = check("42");
        assert!(!verdict.valid);
    }
}
