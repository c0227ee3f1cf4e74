//! Routes a tool call through lookup, validation and execution

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ExecutionError, Result};
use crate::tools::ToolRegistry;

/// Message returned to clients when a tool panics
const PANIC_MESSAGE: &str = "tool failed unexpectedly";

/// Calls tools from a frozen registry
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Look up `name`, validate `params` against its schema, then execute
    ///
    /// Each step short-circuits the next. Panics inside the tool are caught
    /// and reported as an internal execution error.
    pub fn dispatch(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self.registry.lookup(name)?;
        tool.validate_params(&params)?;

        let span = tracing::debug_span!("tool_call", tool = name);
        let _guard = span.enter();

        match panic::catch_unwind(AssertUnwindSafe(|| tool.execute(params))) {
            Ok(Ok(value)) => {
                tracing::debug!("tool succeeded");
                Ok(value)
            }
            Ok(Err(err)) => {
                tracing::debug!(kind = err.kind(), error = %err, "tool failed");
                Err(err.into())
            }
            Err(payload) => {
                tracing::error!(panic = %panic_message(payload.as_ref()), "tool panicked");
                Err(ExecutionError::Internal(PANIC_MESSAGE.to_string()).into())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolsmithError;
    use crate::tools::schema::ValidationError;
    use crate::tools::{test_support, ObjectSchema, Param, Tool, ToolFilter};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts executions, panics on demand
    struct Canary {
        runs: AtomicUsize,
    }

    impl Tool for Canary {
        fn name(&self) -> &'static str {
            "canary"
        }

        fn description(&self) -> &'static str {
            "test canary"
        }

        fn input_schema(&self) -> ObjectSchema {
            ObjectSchema::new().param(Param::boolean("explode", "panic when true").required())
        }

        fn output_schema(&self) -> ObjectSchema {
            ObjectSchema::new().open()
        }

        fn execute(&self, params: Value) -> std::result::Result<Value, ExecutionError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if params["explode"] == json!(true) {
                panic!("secret internal detail");
            }
            Ok(json!({"ok": true}))
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<Canary>) {
        let canary = Arc::new(Canary {
            runs: AtomicUsize::new(0),
        });
        let mut builder = ToolRegistry::builder();
        for tool in crate::tools::builtin_tools(&test_support::context()) {
            builder.register(tool).unwrap();
        }
        builder.register(canary.clone()).unwrap();
        (
            Dispatcher::new(Arc::new(builder.build(&ToolFilter::all()))),
            canary,
        )
    }

    #[test]
    fn test_echo_round_trip() {
        let (d, _) = dispatcher();
        let out = d.dispatch("echo", json!({"message": "hi"})).unwrap();
        assert_eq!(out, json!({"result": "hi"}));
    }

    #[test]
    fn test_unknown_tool_suggests() {
        let (d, _) = dispatcher();
        match d.dispatch("ecoh", json!({})) {
            Err(ToolsmithError::ToolNotFound { name, suggestions }) => {
                assert_eq!(name, "ecoh");
                assert_eq!(suggestions.first().map(String::as_str), Some("echo"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validation_short_circuits_execution() {
        let (d, canary) = dispatcher();
        let err = d.dispatch("canary", json!({})).unwrap_err();
        assert!(matches!(
            err,
            ToolsmithError::InvalidParams(ValidationError::MissingParameter { ref field }) if field == "explode"
        ));
        assert_eq!(canary.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let (d, canary) = dispatcher();
        let err = d.dispatch("canary", json!({"explode": true})).unwrap_err();
        assert_eq!(err.code(), -32000);
        assert!(!err.to_string().contains("secret"));
        assert_eq!(err.data(), Some(json!({"kind": "internal"})));
        assert_eq!(canary.runs.load(Ordering::SeqCst), 1);

        // registry is still usable afterwards
        assert!(d.dispatch("canary", json!({"explode": false})).is_ok());
    }

    #[test]
    fn test_execution_error_keeps_message() {
        let (d, _) = dispatcher();
        let err = d
            .dispatch("time", json!({"operation": "convert", "date": "yesterday"}))
            .unwrap_err();
        assert_eq!(err.code(), -32000);
        assert!(err.to_string().contains("unrecognized date"));
        assert_eq!(err.data(), Some(json!({"kind": "invalid_input"})));
    }
}
