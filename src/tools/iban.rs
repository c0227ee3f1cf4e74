//! International Bank Account Numbers (ISO 13616)

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::checksum::{mod97, strip_separators};
use super::{
    action_param, count_param, default_count, identifier_result_schema, require_value,
    value_param, Action, ObjectSchema, Param, TypedTool, Verdict,
};
use crate::capabilities::Entropy;
use crate::error::ExecutionError;

#[derive(Debug, Clone, Copy)]
enum CharClass {
    /// Digits
    N,
    /// Uppercase letters
    A,
    /// Uppercase letters and digits
    C,
}

struct CountrySpec {
    code: &'static str,
    bban: &'static [(usize, CharClass)],
}

impl CountrySpec {
    fn length(&self) -> usize {
        4 + self.bban.iter().map(|(n, _)| n).sum::<usize>()
    }
}

/// Countries the generator knows the BBAN structure of
const GENERATABLE: &[CountrySpec] = &[
    CountrySpec { code: "DE", bban: &[(18, CharClass::N)] },
    CountrySpec { code: "GB", bban: &[(4, CharClass::A), (14, CharClass::N)] },
    CountrySpec { code: "FR", bban: &[(10, CharClass::N), (11, CharClass::C), (2, CharClass::N)] },
    CountrySpec { code: "NL", bban: &[(4, CharClass::A), (10, CharClass::N)] },
    CountrySpec { code: "ES", bban: &[(20, CharClass::N)] },
    CountrySpec { code: "IT", bban: &[(1, CharClass::A), (10, CharClass::N), (12, CharClass::C)] },
    CountrySpec { code: "BE", bban: &[(12, CharClass::N)] },
    CountrySpec { code: "CH", bban: &[(5, CharClass::N), (12, CharClass::C)] },
    CountrySpec { code: "AT", bban: &[(16, CharClass::N)] },
    CountrySpec { code: "PL", bban: &[(24, CharClass::N)] },
];

pub const COUNTRY_CHOICES: &[&str] = &["DE", "GB", "FR", "NL", "ES", "IT", "BE", "CH", "AT", "PL"];

/// Registered lengths of countries only checked, never generated
const EXTRA_LENGTHS: &[(&str, usize)] = &[
    ("DK", 18),
    ("FI", 18),
    ("IE", 22),
    ("LU", 20),
    ("NO", 15),
    ("PT", 25),
    ("SE", 24),
];

fn expected_length(country: &str) -> Option<usize> {
    GENERATABLE
        .iter()
        .find(|c| c.code == country)
        .map(CountrySpec::length)
        .or_else(|| {
            EXTRA_LENGTHS
                .iter()
                .find(|(code, _)| *code == country)
                .map(|(_, len)| *len)
        })
}

/// Letters become 10..35, digits stay as they are
fn to_numeric(s: &str) -> String {
    s.chars()
        .filter_map(|c| c.to_digit(36))
        .map(|d| d.to_string())
        .collect()
}

/// Two check digits for a country and BBAN
pub fn check_digits(country: &str, bban: &str) -> String {
    let remainder = mod97(&to_numeric(&format!("{}{}00", bban, country)));
    format!("{:02}", 98 - remainder)
}

/// Print format: groups of four separated by spaces
pub fn format_print(iban: &str) -> String {
    iban.as_bytes()
        .chunks(4)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn check(value: &str) -> Verdict {
    let normalized = strip_separators(value).to_uppercase();
    if !(15..=34).contains(&normalized.len()) {
        return Verdict::invalid(normalized, "IBAN has 15 to 34 characters");
    }
    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Verdict::invalid(normalized, "IBAN contains only letters and digits");
    }
    let (country, rest) = normalized.split_at(2);
    if !country.chars().all(|c| c.is_ascii_uppercase()) {
        return Verdict::invalid(normalized, "IBAN starts with a two-letter country code");
    }
    if !rest[..2].chars().all(|c| c.is_ascii_digit()) {
        return Verdict::invalid(normalized, "IBAN check digits are numeric");
    }
    if let Some(len) = expected_length(country) {
        if normalized.len() != len {
            let reason = format!("IBAN for {} has {} characters", country, len);
            return Verdict::invalid(normalized, reason);
        }
    }
    let rearranged = format!("{}{}", &normalized[4..], &normalized[..4]);
    if mod97(&to_numeric(&rearranged)) != 1 {
        return Verdict::invalid(normalized, "IBAN checksum mismatch");
    }
    Verdict::valid(normalized)
}

/// Generates or validates IBANs
pub struct IbanTool {
    entropy: Arc<Entropy>,
}

impl IbanTool {
    pub fn new(entropy: Arc<Entropy>) -> Self {
        Self { entropy }
    }

    fn generate(&self, spec: &CountrySpec) -> String {
        const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

        let bban: String = self.entropy.with(|rng| {
            spec.bban
                .iter()
                .flat_map(|&(n, class)| std::iter::repeat(class).take(n))
                .map(|class| match class {
                    CharClass::N => char::from(b'0' + rng.gen_range(0..10u8)),
                    CharClass::A => char::from(LETTERS[rng.gen_range(0..LETTERS.len())]),
                    CharClass::C => char::from(ALNUM[rng.gen_range(0..ALNUM.len())]),
                })
                .collect()
        });
        format!("{}{}{}", spec.code, check_digits(spec.code, &bban), bban)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IbanInput {
    #[serde(default)]
    pub action: Action,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub formatted: bool,
    pub value: Option<String>,
}

fn default_country() -> String {
    "DE".to_string()
}

#[derive(Debug, Default, Serialize)]
pub struct IbanOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(flatten)]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

impl TypedTool for IbanTool {
    type Input = IbanInput;
    type Output = IbanOutput;

    const NAME: &'static str = "iban";
    const DESCRIPTION: &'static str =
        "Generate IBANs with valid mod-97 check digits for a country, or validate an IBAN.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(action_param())
            .param(
                Param::string("country", "ISO 3166 country code to generate for")
                    .one_of(COUNTRY_CHOICES)
                    .default_value(json!("DE")),
            )
            .param(count_param())
            .param(
                Param::boolean("formatted", "Group generated IBANs in blocks of four")
                    .default_value(json!(false)),
            )
            .param(value_param("IBAN to validate; spaces are ignored"))
    }

    fn result_schema(&self) -> ObjectSchema {
        identifier_result_schema()
            .param(Param::string("country", "Country code of a validated IBAN"))
            .param(Param::string("formatted", "Print format of a valid IBAN"))
    }

    fn run(&self, input: IbanInput) -> Result<IbanOutput, ExecutionError> {
        match input.action {
            Action::Generate => {
                let spec = GENERATABLE
                    .iter()
                    .find(|c| c.code == input.country)
                    .ok_or_else(|| {
                        ExecutionError::Unsupported(format!(
                            "no IBAN layout for country {}",
                            input.country
                        ))
                    })?;
                let values = (0..input.count)
                    .map(|_| {
                        let iban = self.generate(spec);
                        if input.formatted {
                            format_print(&iban)
                        } else {
                            iban
                        }
                    })
                    .collect();
                Ok(IbanOutput {
                    values: Some(values),
                    ..Default::default()
                })
            }
            Action::Validate => {
                let value = require_value(Self::NAME, input.value)?;
                let verdict = check(&value);
                let (country, formatted) = if verdict.valid {
                    (
                        Some(verdict.normalized[..2].to_string()),
                        Some(format_print(&verdict.normalized)),
                    )
                } else {
                    (None, None)
                };
                Ok(IbanOutput {
                    verdict: Some(verdict),
                    country,
                    formatted,
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

    fn tool() -> IbanTool {
        IbanTool::new(test_support::context().entropy)
    }

    #[test]
    fn test_layout_lengths() {
        let lengths: Vec<_> = GENERATABLE.iter().map(|c| (c.code, c.length())).collect();
        assert!(lengths.contains(&("DE", 22)));
        assert!(lengths.contains(&("GB", 22)));
        assert!(lengths.contains(&("FR", 27)));
        assert!(lengths.contains(&("CH", 21)));
        assert_eq!(lengths.len(), COUNTRY_CHOICES.len());
    }

    #[test]
    fn test_check_digits_of_known_iban() {
        assert_eq!(check_digits("DE", "370400440532013000"), "89");
        assert_eq!(check_digits("GB", "NWBK60161331926819"), "29");
    }

    #[test]
    fn test_validate_known_ibans() {
        let out = test_support::call(
            &tool(),
            json!({"action": "validate", "value": "de89 3704 0044 0532 0130 00"}),
        )
        .unwrap();
        assert_eq!(out["valid"], true);
        assert_eq!(out["normalized"], "DE89370400440532013000");
        assert_eq!(out["country"], "DE");
        assert_eq!(out["formatted"], "DE89 3704 0044 0532 0130 00");

        assert!(check("GB29 NWBK 6016 1331 9268 19").valid);
    }

    #[test]
    fn test_rejects_bad_ibans() {
        assert_eq!(
            check("DE88370400440532013000").reason.as_deref(),
            Some("IBAN checksum mismatch")
        );
        assert_eq!(
            check("DE8937040044053201300").reason.as_deref(),
            Some("IBAN for DE has 22 characters")
        );
        assert!(!check("1234").valid);
    }

    #[test]
    fn test_generated_ibans_validate() {
        for country in COUNTRY_CHOICES {
            let out = test_support::call(
                &tool(),
                json!({"country": country, "count": 10, "formatted": true}),
            )
            .unwrap();
            for value in out["values"].as_array().unwrap() {
                let iban = value.as_str().unwrap();
                assert!(iban.starts_with(country));
                assert!(check(iban).valid, "{} failed", iban);
            }
        }
    }
}
