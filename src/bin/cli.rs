//! Toolsmith CLI
//!
//! Serve the MCP engine, or call a single tool and print its result.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use toolsmith::mcp::McpServer;
use toolsmith::{logging, ServerArgs, ServerConfig, ToolsmithError};

#[derive(Parser)]
#[command(name = "toolsmith")]
#[command(about = "Data generation and validation tools for AI agents")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,
    /// Print the enabled tool descriptors
    List,
    /// Call any tool with JSON arguments
    Call {
        /// Tool name
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Echo a message
    Echo(EchoArgs),
    /// Show server name, version and protocol versions
    Version,
    /// Generate or validate UUIDs
    Uuid(UuidArgs),
    /// Generate or validate test credit card numbers
    CreditCard(CreditCardArgs),
    /// Generate or validate ISBNs
    Isbn(IsbnArgs),
    /// Generate or validate EAN-13 barcodes
    Ean13(Ean13Args),
    /// Generate or validate IBANs
    Iban(IbanArgs),
    /// Generate or validate IMO ship numbers
    Imo(ImoArgs),
    /// Generate, validate or classify MMSIs
    Mmsi(MmsiArgs),
    /// Current time and date arithmetic
    Time(TimeArgs),
    /// Random values
    Random(RandomArgs),
}

#[derive(Args, Serialize)]
struct EchoArgs {
    /// Message to echo
    #[arg(long)]
    message: String,
}

#[derive(Args, Serialize)]
struct UuidArgs {
    #[arg(long, value_parser = ["generate", "validate"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    /// v4 or v7
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    /// hyphenated, simple, urn or braced
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    uppercase: Option<bool>,
    /// UUID to validate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Args, Serialize)]
struct CreditCardArgs {
    #[arg(long, value_parser = ["generate", "validate"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    /// visa, mastercard, amex, discover, jcb or diners
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    brand: Option<String>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    /// Card number to validate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Args, Serialize)]
struct IsbnArgs {
    #[arg(long, value_parser = ["generate", "validate"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    /// isbn10 or isbn13
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    /// ISBN to validate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Args, Serialize)]
struct Ean13Args {
    #[arg(long, value_parser = ["generate", "validate"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    /// Leading digits to keep
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    /// EAN-13 to validate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Args, Serialize)]
struct IbanArgs {
    #[arg(long, value_parser = ["generate", "validate"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    /// Country code to generate for
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    /// Group generated IBANs in blocks of four
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    formatted: Option<bool>,
    /// IBAN to validate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Args, Serialize)]
struct ImoArgs {
    #[arg(long, value_parser = ["generate", "validate"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    /// Prefix generated numbers with "IMO "
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<bool>,
    /// IMO number to validate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Args, Serialize)]
struct MmsiArgs {
    #[arg(long, value_parser = ["generate", "validate"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    /// Station kind to generate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    /// Maritime Identification Digits
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    mid: Option<u32>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    /// MMSI to validate
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Args, Serialize)]
struct TimeArgs {
    /// now, add, diff or convert
    #[arg(long, value_parser = ["now", "add", "diff", "convert"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    /// Base date
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    /// Second date for diff
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    other: Option<String>,
    /// Amount to add
    #[arg(long, allow_hyphen_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<i64>,
    /// seconds, minutes, hours, days or weeks
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    /// UTC offset such as +02:00
    #[arg(long, allow_hyphen_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<String>,
    /// strftime format
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Args, Serialize)]
struct RandomArgs {
    /// integer, float, string, bytes or boolean
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u64>,
    /// alphanumeric, alpha, numeric or hex
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    charset: Option<String>,
    /// hex or base64
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

impl Commands {
    /// Tool name and arguments for the one-shot commands
    fn tool_call(&self) -> anyhow::Result<Option<(String, Value)>> {
        let call = match self {
            Commands::Serve | Commands::List => return Ok(None),
            Commands::Call { name, args } => {
                let args: Value = serde_json::from_str(args).map_err(|e| {
                    ToolsmithError::Parse(format!("--args is not valid JSON: {}", e))
                })?;
                (name.clone(), args)
            }
            Commands::Echo(a) => ("echo".to_string(), serde_json::to_value(a)?),
            Commands::Version => ("version".to_string(), serde_json::json!({})),
            Commands::Uuid(a) => ("uuid".to_string(), serde_json::to_value(a)?),
            Commands::CreditCard(a) => ("credit-card".to_string(), serde_json::to_value(a)?),
            Commands::Isbn(a) => ("isbn".to_string(), serde_json::to_value(a)?),
            Commands::Ean13(a) => ("ean13".to_string(), serde_json::to_value(a)?),
            Commands::Iban(a) => ("iban".to_string(), serde_json::to_value(a)?),
            Commands::Imo(a) => ("imo".to_string(), serde_json::to_value(a)?),
            Commands::Mmsi(a) => ("mmsi".to_string(), serde_json::to_value(a)?),
            Commands::Time(a) => ("time".to_string(), serde_json::to_value(a)?),
            Commands::Random(a) => ("random".to_string(), serde_json::to_value(a)?),
        };
        Ok(Some(call))
    }
}

fn run<W: Write>(command: Commands, config: &ServerConfig, out: &mut W) -> anyhow::Result<()> {
    let handler = config.handler()?;

    match command {
        Commands::Serve => {
            tracing::info!(
                server = %config.server_name,
                tools = handler.dispatcher().registry().len(),
                "starting MCP server on stdio"
            );
            McpServer::new(handler).run()?;
        }
        Commands::List => {
            let tools = handler.tool_definitions();
            writeln!(out, "{}", serde_json::to_string_pretty(&tools)?)?;
        }
        other => {
            if let Some((name, args)) = other.tool_call()? {
                let output = handler.dispatcher().dispatch(&name, args)?;
                let text = serde_json::to_string_pretty(&output)
                    .context("failed to render tool output")?;
                writeln!(out, "{}", text)?;
            }
        }
    }
    Ok(())
}

/// Print `error: <message>` and any structured data
fn report<W: Write>(err: &anyhow::Error, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "error: {:#}", err)?;
    if let Some(data) = err.downcast_ref::<ToolsmithError>().and_then(|e| e.data()) {
        if let Ok(text) = serde_json::to_string_pretty(&data) {
            writeln!(out, "{}", text)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ServerConfig::from(cli.server);

    let default_directive = match cli.command {
        Commands::Serve => "info",
        _ => "warn",
    };
    if let Err(e) = logging::init(config.log_format, default_directive) {
        eprintln!("warning: {}", e);
    }

    match run(cli.command, &config, &mut std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = report(&e, &mut std::io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use toolsmith::Tool;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("toolsmith").chain(argv.iter().copied()))
            .expect("valid command line")
    }

    fn call_for(argv: &[&str]) -> (String, Value) {
        parse(argv)
            .command
            .tool_call()
            .expect("arguments convert")
            .expect("one-shot command")
    }

    fn config() -> ServerConfig {
        ServerConfig {
            seed: Some(9),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_subcommand_maps_to_valid_tool_arguments() {
        let command_lines: &[&[&str]] = &[
            &["echo", "--message", "hi"],
            &["version"],
            &["uuid", "--version", "v7", "--format", "urn", "--uppercase", "true", "-c", "2"],
            &["credit-card", "--brand", "amex", "--count", "3"],
            &["isbn", "--action", "validate", "--value", "0-306-40615-2"],
            &["ean13", "--prefix", "50"],
            &["iban", "--country", "FR", "--formatted", "true"],
            &["imo", "--prefix", "false"],
            &["mmsi", "--kind", "coast", "--mid", "211"],
            &["time", "--operation", "add", "--date", "2024-01-01", "--amount", "-2", "--unit", "days"],
            &["random", "--kind", "bytes", "--length", "8", "--encoding", "base64"],
            &["call", "echo", "--args", r#"{"message":"x"}"#],
        ];
        let registry = config().build_registry().unwrap();

        for argv in command_lines {
            let (name, args) = call_for(argv);
            let tool = registry.lookup(&name).unwrap_or_else(|e| panic!("{:?}: {}", argv, e));
            assert!(
                tool.validate_params(&args).is_ok(),
                "{:?} produced invalid arguments {}",
                argv,
                args
            );
        }
    }

    #[test]
    fn test_flags_become_arguments() {
        assert_eq!(
            call_for(&["random", "--min", "-5", "--max", "5", "-c", "3"]),
            ("random".to_string(), json!({"min": -5, "max": 5, "count": 3}))
        );
        assert_eq!(call_for(&["uuid"]), ("uuid".to_string(), json!({})));
        assert_eq!(
            call_for(&["credit-card", "--action", "validate", "--value", "4111 1111 1111 1111"]),
            (
                "credit-card".to_string(),
                json!({"action": "validate", "value": "4111 1111 1111 1111"})
            )
        );
        assert!(parse(&["list"]).command.tool_call().unwrap().is_none());
    }

    #[test]
    fn test_invalid_args_json_is_parse_error() {
        let err = parse(&["call", "echo", "--args", "{not json"])
            .command
            .tool_call()
            .unwrap_err();
        let err = err.downcast_ref::<ToolsmithError>().expect("typed error");
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn test_success_prints_pretty_json() {
        let mut out = Vec::new();
        run(parse(&["echo", "--message", "hi"]).command, &config(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\n  \"result\": \"hi\"\n}\n");
    }

    #[test]
    fn test_failure_reports_message_and_data() {
        let mut out = Vec::new();
        let err = run(parse(&["call", "echo"]).command, &config(), &mut out).unwrap_err();
        assert!(out.is_empty());

        let mut stderr = Vec::new();
        report(&err, &mut stderr).unwrap();
        let text = String::from_utf8(stderr).unwrap();
        let (first, data) = text.split_once('\n').unwrap();
        assert!(first.starts_with("error: "), "{}", text);
        assert!(first.contains("message"), "{}", text);
        let data: Value = serde_json::from_str(data).unwrap();
        assert_eq!(data, json!({"kind": "missing_parameter", "field": "message"}));
    }

    #[test]
    fn test_unknown_tool_reports_suggestions() {
        let mut out = Vec::new();
        let err = run(parse(&["call", "ecko"]).command, &config(), &mut out).unwrap_err();
        let mut stderr = Vec::new();
        report(&err, &mut stderr).unwrap();
        let text = String::from_utf8(stderr).unwrap();
        assert!(text.starts_with("error: "));
        assert!(text.contains("\"echo\""), "{}", text);
    }
}
