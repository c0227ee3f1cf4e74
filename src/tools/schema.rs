//! Tool schema descriptors
//!
//! A single [`ObjectSchema`] per tool drives both the JSON Schema advertised by
//! `tools/list` and the validation run before a tool executes, so the two can
//! never drift apart.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Structured validation failure, serialized into the JSON-RPC `data` member
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Parameters must be a JSON object, got {actual}")]
    NotAnObject { actual: &'static str },

    #[error("Missing required parameter: {field}")]
    MissingParameter { field: String },

    #[error("Parameter '{field}' must be of type {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: &'static str,
    },

    #[error("Parameter '{field}' violates constraint: {constraint}")]
    Constraint { field: String, constraint: String },

    #[error("Unknown parameter: {field}")]
    UnknownParameter { field: String },
}

/// JSON type of a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array(Box<ParamType>),
}

impl ParamType {
    /// JSON Schema name of the type
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array(_) => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array(_) => value.is_array(),
        }
    }

    fn describe(&self) -> String {
        match self {
            ParamType::Array(items) => format!("array of {}", items.describe()),
            other => other.name().to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ParamType::Array(items) => json!({"type": "array", "items": items.to_json()}),
            other => json!({"type": other.name()}),
        }
    }
}

/// Name of a JSON value's type, as reported in type mismatches
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single named parameter and its constraints
#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub choices: Option<&'static [&'static str]>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description,
            required: false,
            choices: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            default: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::String, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Integer, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Number, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Boolean, description)
    }

    pub fn object(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Object, description)
    }

    pub fn array(name: &'static str, items: ParamType, description: &'static str) -> Self {
        Self::new(name, ParamType::Array(Box::new(items)), description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict a string parameter to a fixed set of values
    pub fn one_of(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Inclusive numeric range
    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Inclusive string length range, counted in characters
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn to_json(&self) -> Value {
        let mut schema = match self.ty.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if !self.description.is_empty() {
            schema.insert("description".into(), json!(self.description));
        }
        if let Some(choices) = self.choices {
            schema.insert("enum".into(), json!(choices));
        }
        if let Some(min) = self.minimum {
            schema.insert("minimum".into(), number_json(min));
        }
        if let Some(max) = self.maximum {
            schema.insert("maximum".into(), number_json(max));
        }
        if let Some(min) = self.min_length {
            schema.insert("minLength".into(), json!(min));
        }
        if let Some(max) = self.max_length {
            schema.insert("maxLength".into(), json!(max));
        }
        if let Some(ref default) = self.default {
            schema.insert("default".into(), default.clone());
        }
        Value::Object(schema)
    }

    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        check_type(self.name, &self.ty, value)?;

        if let (Some(choices), Some(s)) = (self.choices, value.as_str()) {
            if !choices.contains(&s) {
                return Err(ValidationError::Constraint {
                    field: self.name.to_string(),
                    constraint: format!("must be one of: {}", choices.join(", ")),
                });
            }
        }

        if let Some(min) = self.minimum {
            if compare_to_bound(value, min) == Some(Ordering::Less) {
                return Err(ValidationError::Constraint {
                    field: self.name.to_string(),
                    constraint: format!("must be >= {}", min),
                });
            }
        }
        if let Some(max) = self.maximum {
            if compare_to_bound(value, max) == Some(Ordering::Greater) {
                return Err(ValidationError::Constraint {
                    field: self.name.to_string(),
                    constraint: format!("must be <= {}", max),
                });
            }
        }

        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if let Some(min) = self.min_length {
                if len < min {
                    return Err(ValidationError::Constraint {
                        field: self.name.to_string(),
                        constraint: format!("length must be >= {}", min),
                    });
                }
            }
            if let Some(max) = self.max_length {
                if len > max {
                    return Err(ValidationError::Constraint {
                        field: self.name.to_string(),
                        constraint: format!("length must be <= {}", max),
                    });
                }
            }
        }

        Ok(())
    }
}

fn check_type(field: &str, ty: &ParamType, value: &Value) -> Result<(), ValidationError> {
    if !ty.matches(value) {
        return Err(ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: ty.describe(),
            actual: json_type_name(value),
        });
    }
    if let (ParamType::Array(items), Some(values)) = (ty, value.as_array()) {
        for (i, item) in values.iter().enumerate() {
            check_type(&format!("{}[{}]", field, i), items, item)?;
        }
    }
    Ok(())
}

/// Order a JSON number against a bound, exactly when both are integers
fn compare_to_bound(value: &Value, bound: f64) -> Option<Ordering> {
    if bound.fract() == 0.0 && bound.abs() < i64::MAX as f64 {
        let bound = bound as i64;
        if let Some(n) = value.as_i64() {
            return Some(n.cmp(&bound));
        }
        if value.as_u64().is_some() {
            return Some(Ordering::Greater);
        }
    }
    value.as_f64()?.partial_cmp(&bound)
}

// Render whole-number bounds as JSON integers so schemas read naturally
fn number_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

/// Schema of a JSON object made of named parameters
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    params: Vec<Param>,
    closed: bool,
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSchema {
    /// An empty, closed schema (unknown keys are rejected)
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            closed: true,
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Allow keys that are not declared
    pub fn open(mut self) -> Self {
        self.closed = false;
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// JSON Schema rendering used for discovery
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            properties.insert(param.name.to_string(), param.to_json());
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": !self.closed,
        })
    }

    /// Check a value against this schema.
    ///
    /// Declared params are checked in declaration order, then unknown keys.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject {
            actual: json_type_name(value),
        })?;

        for param in &self.params {
            match object.get(param.name) {
                None if param.required => {
                    return Err(ValidationError::MissingParameter {
                        field: param.name.to_string(),
                    })
                }
                None => {}
                Some(v) => param.validate(v)?,
            }
        }

        if self.closed {
            if let Some(unknown) = object
                .keys()
                .find(|k| !self.params.iter().any(|p| p.name == k.as_str()))
            {
                return Err(ValidationError::UnknownParameter {
                    field: unknown.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ObjectSchema {
        ObjectSchema::new()
            .param(Param::string("message", "Text").required().length(1, 8))
            .param(Param::string("mode", "Mode").one_of(&["fast", "slow"]))
            .param(Param::integer("count", "How many").range(1.0, 10.0))
            .param(Param::array("tags", ParamType::String, "Tags"))
    }

    #[test]
    fn test_accepts_declared_shapes() {
        let schema = sample();
        assert!(schema.validate(&json!({"message": "hi"})).is_ok());
        assert!(schema
            .validate(&json!({"message": "hi", "mode": "slow", "count": 10, "tags": ["a"]}))
            .is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = sample().validate(&json!({"mode": "fast"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingParameter {
                field: "message".into()
            }
        );
    }

    #[test]
    fn test_type_mismatch() {
        let err = sample().validate(&json!({"message": 42})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                field: "message".into(),
                expected: "string".into(),
                actual: "integer",
            }
        );
    }

    #[test]
    fn test_null_is_a_type_mismatch() {
        let err = sample()
            .validate(&json!({"message": "hi", "count": null}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { actual: "null", .. }));
    }

    #[test]
    fn test_integer_rejects_floats() {
        let err = sample()
            .validate(&json!({"message": "hi", "count": 2.5}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { actual: "number", .. }));
    }

    #[test]
    fn test_enum_and_range_constraints() {
        let schema = sample();
        let err = schema
            .validate(&json!({"message": "hi", "mode": "medium"}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Constraint { ref field, .. } if field == "mode"));

        let err = schema
            .validate(&json!({"message": "hi", "count": 11}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Constraint { ref field, .. } if field == "count"));

        let err = schema.validate(&json!({"message": ""})).unwrap_err();
        assert!(matches!(err, ValidationError::Constraint { ref field, .. } if field == "message"));
    }

    #[test]
    fn test_integer_bounds_compare_exactly() {
        let schema = ObjectSchema::new().param(Param::integer("n", "Bounded").range(-1e18, 1e18));
        assert!(schema.validate(&json!({"n": 1_000_000_000_000_000_000i64})).is_ok());
        assert!(schema.validate(&json!({"n": -1_000_000_000_000_000_000i64})).is_ok());

        for n in [
            json!(1_000_000_000_000_000_001i64),
            json!(-1_000_000_000_000_000_001i64),
            json!(u64::MAX),
        ] {
            let err = schema.validate(&json!({ "n": n })).unwrap_err();
            assert!(matches!(err, ValidationError::Constraint { ref field, .. } if field == "n"));
        }
    }

    #[test]
    fn test_integers_beyond_u64_are_numbers() {
        let huge: Value = serde_json::from_str("18446744073709551617").unwrap();
        let err = sample()
            .validate(&json!({"message": "hi", "count": huge}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { actual: "number", .. }));
    }

    #[test]
    fn test_array_items_report_index() {
        let err = sample()
            .validate(&json!({"message": "hi", "tags": ["a", 1]}))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                field: "tags[1]".into(),
                expected: "string".into(),
                actual: "integer",
            }
        );
    }

    #[test]
    fn test_closed_schema_rejects_unknown_keys() {
        let err = sample()
            .validate(&json!({"message": "hi", "extra": true}))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownParameter {
                field: "extra".into()
            }
        );

        let open = sample().open();
        assert!(open.validate(&json!({"message": "hi", "extra": true})).is_ok());
    }

    #[test]
    fn test_not_an_object() {
        let err = sample().validate(&json!(["message"])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject { actual: "array" });
    }

    #[test]
    fn test_json_rendering() {
        let schema = sample().to_json();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["message"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["mode"]["enum"], json!(["fast", "slow"]));
        assert_eq!(schema["properties"]["count"]["minimum"], json!(1));
        assert_eq!(schema["properties"]["count"]["maximum"], json!(10));
        assert_eq!(schema["properties"]["tags"]["items"], json!({"type": "string"}));
    }

    #[test]
    fn test_validation_error_serializes_with_kind() {
        let err = ValidationError::Constraint {
            field: "count".into(),
            constraint: "must be <= 10".into(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"kind": "constraint", "field": "count", "constraint": "must be <= 10"})
        );
    }
}
