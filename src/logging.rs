//! Tracing subscriber setup
//!
//! Stdout carries the protocol, so logs always go to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::error::{Result, ToolsmithError};

/// Install the global subscriber; `RUST_LOG` overrides `default_directive`
pub fn init(format: LogFormat, default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| ToolsmithError::Config(format!("logging already initialized: {}", e)))
}
