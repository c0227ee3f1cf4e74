//! Command-line and environment configuration

use std::sync::Arc;

use clap::{Args, ValueEnum};

use crate::capabilities::Entropy;
use crate::error::{Result, ToolsmithError};
use crate::mcp::ToolsmithHandler;
use crate::tools::{default_registry, ToolContext, ToolFilter, ToolRegistry};

/// Log line format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Flags shared by both binaries
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Comma-separated tool names to enable (default: all)
    #[arg(long, env = "TOOLSMITH_ENABLED_TOOLS", global = true)]
    pub enable_tools: Option<String>,

    /// Comma-separated tool names to disable
    #[arg(long, env = "TOOLSMITH_DISABLED_TOOLS", global = true)]
    pub disable_tools: Option<String>,

    /// Seed for reproducible random output
    #[arg(long, env = "TOOLSMITH_SEED", global = true)]
    pub seed: Option<u64>,

    /// Name reported in serverInfo
    #[arg(long, env = "TOOLSMITH_SERVER_NAME", default_value = "toolsmith", global = true)]
    pub server_name: String,

    /// Log format (text or json)
    #[arg(long, env = "TOOLSMITH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}

/// Resolved configuration, consumed once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub filter: ToolFilter,
    pub seed: Option<u64>,
    pub server_name: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            filter: ToolFilter::all(),
            seed: None,
            server_name: "toolsmith".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            filter: ToolFilter::from_lists(
                args.enable_tools.as_deref(),
                args.disable_tools.as_deref(),
            ),
            seed: args.seed,
            server_name: args.server_name,
            log_format: args.log_format,
        }
    }
}

impl ServerConfig {
    /// Capabilities handed to the built-in tools
    pub fn context(&self) -> ToolContext {
        ToolContext::new(self.server_name.clone())
            .with_entropy(Arc::new(Entropy::from_seed(self.seed)))
    }

    /// Register the built-in tools and apply the filter
    pub fn build_registry(&self) -> Result<ToolRegistry> {
        if self.server_name.trim().is_empty() {
            return Err(ToolsmithError::Config("server name must not be empty".into()));
        }
        if let Some(seed) = self.seed {
            tracing::info!(seed, "random output is seeded");
        }
        default_registry(&self.context(), &self.filter)
    }

    pub fn handler(&self) -> Result<ToolsmithHandler> {
        let registry = self.build_registry()?;
        Ok(ToolsmithHandler::new(Arc::new(registry), self.server_name.clone()))
    }
}
