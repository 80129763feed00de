use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};
use pim_jsonrpc::DEFAULT_TIMEOUT_MS;
use pim_schema::{DEFAULT_LIMIT, DEFAULT_START};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    name = "pim-cli",
    version,
    about = "Command-line client for the PIM JSON-RPC API"
)]
pub(crate) struct Cli {
    #[arg(long, env = "PIM_ENDPOINT", help = "JSON-RPC endpoint URL")]
    pub(crate) endpoint: String,

    #[arg(long, env = "PIM_LOGIN", help = "Login name used when no fresh session is cached")]
    pub(crate) login: Option<String>,

    #[arg(
        long,
        env = "PIM_PASSWORD",
        hide_env_values = true,
        help = "Password used when no fresh session is cached"
    )]
    pub(crate) password: Option<String>,

    #[arg(
        long,
        env = "PIM_TOKEN",
        hide_env_values = true,
        help = "Session id to use directly, bypassing login and the token cache"
    )]
    pub(crate) token: Option<String>,

    #[arg(
        long = "token-cache",
        env = "PIM_TOKEN_CACHE",
        default_value = ".auth-token",
        help = "File caching the session id between runs"
    )]
    pub(crate) token_cache: PathBuf,

    #[arg(
        long = "timeout-ms",
        env = "PIM_TIMEOUT_MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        help = "Connect and total timeout for each HTTP exchange"
    )]
    pub(crate) timeout_ms: u64,

    #[arg(
        long,
        env = "PIM_INSECURE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new(),
        help = "Skip TLS certificate verification; the variable accepts 1/0, yes/no, on/off"
    )]
    pub(crate) insecure: bool,

    #[arg(
        long = "header",
        value_name = "NAME=VALUE",
        value_parser = parse_header,
        help = "Extra HTTP header sent with every request; repeatable"
    )]
    pub(crate) headers: Vec<(String, String)>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print the id of the attribute set keyed `pim_base_set`.
    BaseAttributeSet,
    /// Print attribute sets as JSON.
    ListAttributeSets {
        #[arg(long, default_value_t = DEFAULT_START)]
        start: i64,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,
        #[arg(
            long = "filter",
            value_name = "PROPERTY=VALUE",
            value_parser = parse_filter,
            help = "Equality filter; the value is read as JSON when it parses, else as a string"
        )]
        filters: Vec<(String, Value)>,
    },
    /// Call any method and print its result as JSON.
    Call {
        method: String,
        #[arg(long, value_parser = parse_json_arg, help = "JSON argument passed as the single param")]
        arg: Option<Value>,
        #[arg(long, help = "Send as a notification and do not wait for a result")]
        notify: bool,
    },
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = split_pair(raw)?;
    Ok((name.to_string(), value.trim().to_string()))
}

pub(crate) fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (property, value) = split_pair(raw)?;
    let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((property.to_string(), value))
}

fn parse_json_arg(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|error| format!("invalid JSON argument: {error}"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use serde_json::json;

    use super::{parse_filter, Cli, Command};

    #[test]
    fn unit_filter_values_prefer_json() {
        assert_eq!(parse_filter("id=3"), Ok(("id".to_string(), json!(3))));
        assert_eq!(
            parse_filter("key=pim_base_set"),
            Ok(("key".to_string(), json!("pim_base_set")))
        );
        assert!(parse_filter("=x").is_err());
        assert!(parse_filter("novalue").is_err());
    }

    #[test]
    fn unit_cli_parses_list_command_with_defaults() {
        let cli = Cli::try_parse_from([
            "pim-cli",
            "--endpoint",
            "http://localhost/jsonrpc",
            "list-attribute-sets",
            "--filter",
            "key=shoes",
        ])
        .expect("parse");
        assert_eq!(cli.timeout_ms, 30_000);
        assert!(!cli.insecure);
        match cli.command {
            Command::ListAttributeSets {
                start,
                limit,
                filters,
            } => {
                assert_eq!((start, limit), (0, 50));
                assert_eq!(filters, vec![("key".to_string(), json!("shoes"))]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unit_insecure_flag_needs_no_value() {
        let cli = Cli::try_parse_from([
            "pim-cli",
            "--endpoint",
            "http://localhost/jsonrpc",
            "--insecure",
            "base-attribute-set",
        ])
        .expect("parse");
        assert!(cli.insecure);
    }

    #[test]
    fn regression_call_rejects_malformed_json_argument() {
        let error = Cli::try_parse_from([
            "pim-cli",
            "--endpoint",
            "http://localhost/jsonrpc",
            "call",
            "system.ping",
            "--arg",
            "{broken",
        ])
        .expect_err("malformed json");
        assert!(error.to_string().contains("invalid JSON argument"));
    }
}
