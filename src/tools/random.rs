//! Random values of a few primitive kinds

use std::sync::Arc;

use base64::Engine as _;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{count_param, default_count, ObjectSchema, Param, ParamType, TypedTool};
use crate::capabilities::Entropy;
use crate::error::ExecutionError;

pub const MAX_LENGTH: usize = 4096;

/// Magnitude limit of `min` and `max`, inside the i64 range
const BOUND_LIMIT: f64 = 1e18;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomKind {
    #[default]
    Integer,
    Float,
    String,
    Bytes,
    Boolean,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Alphanumeric,
    Alpha,
    Numeric,
    Hex,
}

impl Charset {
    fn alphabet(self) -> &'static [u8] {
        match self {
            Charset::Alphanumeric => {
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789"
            }
            Charset::Alpha => b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
            Charset::Numeric => b"0123456789",
            Charset::Hex => b"0123456789abcdef",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Hex,
    Base64,
}

/// Draws integers, floats, strings, bytes and booleans
pub struct RandomTool {
    entropy: Arc<Entropy>,
}

impl RandomTool {
    pub fn new(entropy: Arc<Entropy>) -> Self {
        Self { entropy }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomInput {
    #[serde(default)]
    pub kind: RandomKind,
    #[serde(default)]
    pub min: i64,
    #[serde(default = "default_max")]
    pub max: i64,
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default)]
    pub charset: Charset,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_max() -> i64 {
    100
}

fn default_length() -> usize {
    16
}

/// Exactly one of the value arrays is present, matching `kind`
#[derive(Debug, Default, Serialize)]
pub struct RandomOutput {
    pub kind: RandomKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integers: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floats: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booleans: Option<Vec<bool>>,
}

impl TypedTool for RandomTool {
    type Input = RandomInput;
    type Output = RandomOutput;

    const NAME: &'static str = "random";
    const DESCRIPTION: &'static str =
        "Random integers or floats in [min, max], random strings over a charset, random bytes (hex or base64), or booleans.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(
                Param::string("kind", "Kind of value to draw")
                    .one_of(&["integer", "float", "string", "bytes", "boolean"])
                    .default_value(json!("integer")),
            )
            .param(
                Param::integer("min", "Lower bound for integer and float")
                    .range(-BOUND_LIMIT, BOUND_LIMIT)
                    .default_value(json!(0)),
            )
            .param(
                Param::integer("max", "Upper bound for integer (inclusive) and float (exclusive)")
                    .range(-BOUND_LIMIT, BOUND_LIMIT)
                    .default_value(json!(100)),
            )
            .param(
                Param::integer("length", "Characters per string or bytes per value")
                    .range(1.0, MAX_LENGTH as f64)
                    .default_value(json!(16)),
            )
            .param(
                Param::string("charset", "Alphabet for strings")
                    .one_of(&["alphanumeric", "alpha", "numeric", "hex"])
                    .default_value(json!("alphanumeric")),
            )
            .param(
                Param::string("encoding", "Text encoding for bytes")
                    .one_of(&["hex", "base64"])
                    .default_value(json!("hex")),
            )
            .param(count_param())
    }

    fn result_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(
                Param::string("kind", "Kind of the values")
                    .one_of(&["integer", "float", "string", "bytes", "boolean"])
                    .required(),
            )
            .param(Param::array("integers", ParamType::Integer, "Values for kind integer"))
            .param(Param::array("floats", ParamType::Number, "Values for kind float"))
            .param(Param::array("strings", ParamType::String, "Values for kind string and bytes"))
            .param(Param::array("booleans", ParamType::Boolean, "Values for kind boolean"))
    }

    fn run(&self, input: RandomInput) -> Result<RandomOutput, ExecutionError> {
        let n = input.count;
        let mut out = RandomOutput {
            kind: input.kind,
            ..Default::default()
        };

        match input.kind {
            RandomKind::Integer | RandomKind::Float if input.min > input.max => {
                return Err(ExecutionError::invalid_input(format!(
                    "min ({}) is greater than max ({})",
                    input.min, input.max
                )));
            }
            RandomKind::Integer => {
                let (min, max) = (input.min, input.max);
                out.integers =
                    Some(self.entropy.with(|rng| (0..n).map(|_| rng.gen_range(min..=max)).collect()));
            }
            RandomKind::Float => {
                let (min, max) = (input.min as f64, input.max as f64);
                out.floats = Some(self.entropy.with(|rng| {
                    (0..n)
                        .map(|_| if min == max { min } else { rng.gen_range(min..max) })
                        .collect()
                }));
            }
            RandomKind::String => {
                let alphabet = input.charset.alphabet();
                out.strings = Some(self.entropy.with(|rng| {
                    (0..n)
                        .map(|_| {
                            (0..input.length)
                                .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
                                .collect()
                        })
                        .collect()
                }));
            }
            RandomKind::Bytes => {
                let values = (0..n)
                    .map(|_| {
                        let mut buf = vec![0u8; input.length];
                        self.entropy.fill_bytes(&mut buf);
                        match input.encoding {
                            Encoding::Hex => hex::encode(&buf),
                            Encoding::Base64 => base64::engine::general_purpose::STANDARD.encode(&buf),
                        }
                    })
                    .collect();
                out.strings = Some(values);
            }
            RandomKind::Boolean => {
                out.booleans = Some(self.entropy.with(|rng| (0..n).map(|_| rng.gen_bool(0.5)).collect()));
            }
        }
        Ok(out)
    }
}
