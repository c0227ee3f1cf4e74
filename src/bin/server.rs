//! Toolsmith MCP Server
//!
//! Run with: toolsmith-server

use clap::Parser;

use toolsmith::error::Result;
use toolsmith::mcp::McpServer;
use toolsmith::{logging, ServerArgs, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "toolsmith-server")]
#[command(about = "Toolsmith MCP server (JSON-RPC on stdio)")]
#[command(version)]
struct Args {
    #[command(flatten)]
    server: ServerArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServerConfig::from(args.server);

    // Logs go to stderr, stdout is for MCP protocol
    logging::init(config.log_format, "info")?;

    let handler = config.handler()?;
    tracing::info!(
        server = %config.server_name,
        tools = handler.dispatcher().registry().len(),
        "Toolsmith MCP server starting"
    );

    McpServer::new(handler).run()
}
