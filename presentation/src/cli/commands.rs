//! CLI command definitions

use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

/// Output format for mission results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plan, full transcript, thoughts and spend
    Full,
    /// Status, quality and the final answer
    Summary,
    /// JSON mission outcome
    Json,
}

/// CLI arguments for swarm-council
#[derive(Parser, Debug)]
#[command(name = "swarm-council")]
#[command(author, version, about = "Specialist council - a supervisor routes a swarm of LLM specialists to a goal")]
#[command(long_about = r#"
swarm-council decomposes a goal into subtasks, runs a council of specialists
(research, strategy, creative, operator, qa) in parallel rounds, and lets a
supervisor route between research and execution until the work passes its
quality gate or a budget, iteration or time limit stops it.

Configuration files are loaded from (in priority order):
1. SWARM_* environment variables   e.g. SWARM_MISSION__MAX_ITERATIONS=4
2. --config <path>                  Explicit config file
3. ./swarm.toml                     Project-level config
4. ~/.config/swarm-council/config.toml   Global config

Example:
  swarm-council "Plan the launch of our spring menu" --workspace bakery
  swarm-council --offline --output summary "Draft a newsletter"
  swarm-council "Pitch deck outline" -w acme --set audience=investors --set budget=5000
"#)]
pub struct Cli {
    /// The goal to hand to the council
    pub goal: Option<String>,

    /// Workspace the mission belongs to (budget and context are per workspace)
    #[arg(short, long, value_name = "ID", default_value = "default")]
    pub workspace: String,

    /// Session id recorded in the mission context
    #[arg(long, value_name = "ID")]
    pub session: Option<String>,

    /// Context override (repeatable); values are parsed as JSON when possible
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, Value)>,

    /// Output format (defaults to [output].format, then summary)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Use canned offline replies instead of the configured gateway
    #[arg(long)]
    pub offline: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Parse `KEY=VALUE`. The value is read as JSON when it parses, else kept
/// as a string.
pub fn parse_override(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("budget=5000").unwrap(),
            ("budget".to_string(), Value::from(5000))
        );
        assert_eq!(
            parse_override("audience=small teams").unwrap(),
            ("audience".to_string(), Value::from("small teams"))
        );
        assert_eq!(
            parse_override("expr=a=b").unwrap(),
            ("expr".to_string(), Value::from("a=b"))
        );
        assert!(parse_override("novalue").is_err());
        assert!(parse_override("=x").is_err());
    }

    #[test]
    fn test_cli_parses_full_invocation() {
        let cli = Cli::try_parse_from([
            "swarm-council",
            "Launch the menu",
            "-w",
            "bakery",
            "--set",
            "region=\"north\"",
            "--set",
            "stores=3",
            "--output",
            "json",
            "--offline",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.goal.as_deref(), Some("Launch the menu"));
        assert_eq!(cli.workspace, "bakery");
        assert_eq!(cli.overrides.len(), 2);
        assert_eq!(cli.overrides[0].1, Value::from("north"));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(cli.offline);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["swarm-council", "goal"]).unwrap();
        assert_eq!(cli.workspace, "default");
        assert!(cli.output.is_none());
        assert!(!cli.quiet);
    }
}
