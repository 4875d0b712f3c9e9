use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ccproxy", version, about = "Dependency-aware HTTP request aggregation")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve `/cc/aggregate`, `/cc/proxy` and `/health`.
    Serve(ServeArgs),
    /// Execute one aggregate request from a JSON file and print the response.
    Run(RunArgs),
    /// Print the round partition a request would follow, without calling anything.
    Plan(PlanArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Overrides `[http_server].host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `[http_server].port`.
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub session_id: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// AggregateRequest JSON file, or `-` for stdin.
    pub file: PathBuf,

    /// Client header forwarded through the allow-list (`name: value`).
    /// Can be specified multiple times.
    #[arg(long = "header", short = 'H', value_parser = parse_header, action = clap::ArgAction::Append)]
    pub headers: Vec<(String, String)>,

    /// Overrides `[transport].base_url`.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the per-round trace to stderr.
    #[arg(long)]
    pub trace: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    /// AggregateRequest JSON file, or `-` for stdin.
    pub file: PathBuf,
}

pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
