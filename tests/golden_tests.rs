//! Golden tests - fixture-based tests that lock expected behavior
//!
//! These tests run published identifiers through the validators and fixed
//! dates through the time tool. Any change in behavior will cause these
//! tests to fail, signaling a potential breaking change.
//!
//! Run with: cargo test --test golden_tests

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;

use toolsmith::{Dispatcher, ServerConfig};

#[derive(Debug, Deserialize)]
struct Fixture {
    test_cases: Vec<IdentifierCase>,
    time_cases: Vec<TimeCase>,
}

#[derive(Debug, Deserialize)]
struct IdentifierCase {
    name: String,
    tool: String,
    value: String,
    expected: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TimeCase {
    name: String,
    args: Value,
    expected: Map<String, Value>,
}

fn load_fixture() -> Fixture {
    let fixture_path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/identifiers.json");
    let content =
        fs::read_to_string(fixture_path).expect("Failed to read identifiers.json fixture");
    serde_json::from_str(&content).expect("Failed to parse fixture JSON")
}

fn dispatcher() -> Dispatcher {
    ServerConfig::default()
        .handler()
        .expect("built-in registry")
        .dispatcher()
        .clone()
}

fn assert_subset(case: &str, actual: &Value, expected: &Map<String, Value>) {
    for (key, want) in expected {
        assert_eq!(
            actual.get(key),
            Some(want),
            "Case '{}': field '{}' mismatch in {}",
            case,
            key,
            actual
        );
    }
}

// ============================================================================
// IDENTIFIER GOLDEN TESTS
// ============================================================================

#[test]
fn test_identifier_validation_golden() {
    let fixture = load_fixture();
    let dispatcher = dispatcher();

    for case in &fixture.test_cases {
        let params = serde_json::json!({"action": "validate", "value": case.value});
        let result = dispatcher.dispatch(&case.tool, params);
        assert!(
            result.is_ok(),
            "Case '{}': expected a verdict, got {:?}",
            case.name,
            result.err()
        );
        let actual = result.unwrap();
        assert_subset(&case.name, &actual, &case.expected);

        if actual["valid"] == Value::Bool(false) {
            assert!(
                actual.get("reason").is_some(),
                "Case '{}': invalid verdicts carry a reason",
                case.name
            );
        }
    }
}

#[test]
fn test_fixture_covers_every_identifier_tool() {
    let fixture = load_fixture();
    for tool in ["uuid", "credit-card", "isbn", "ean13", "iban", "imo", "mmsi"] {
        assert!(
            fixture.test_cases.iter().any(|c| c.tool == tool),
            "no golden case for {}",
            tool
        );
    }
}

// ============================================================================
// TIME GOLDEN TESTS
// ============================================================================

#[test]
fn test_time_golden() {
    let fixture = load_fixture();
    let dispatcher = dispatcher();

    for case in &fixture.time_cases {
        let result = dispatcher.dispatch("time", case.args.clone());
        assert!(
            result.is_ok(),
            "Case '{}': expected Ok, got {:?}",
            case.name,
            result.err()
        );
        assert_subset(&case.name, &result.unwrap(), &case.expected);
    }
}
