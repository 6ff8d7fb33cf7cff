//! CLI module for Picker
//!
//! Provides commands:
//! - `fetch`: Fetch a URL through the resilient gateway
//! - `extract`: Recover a normalized structure from model output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod extract;
pub mod fetch;

/// Picker CLI
#[derive(Parser, Debug)]
#[command(name = "picker")]
#[command(about = "Rate-limit aware fetch gateway and structured output extractor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a URL with retries, breaker and cache
    Fetch {
        /// Target URL
        url: String,
        /// Extra request header, as `name:value` (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
        /// Logical cache key for the response cache
        #[arg(long)]
        cache_key: Option<String>,
        /// Overall deadline for the call, retries included
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Extract a normalized structure from free-form text
    Extract {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Treat the input as a response envelope and read its output text
        #[arg(long)]
        envelope: bool,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Fetch {
            url,
            headers,
            cache_key,
            timeout_secs,
        }) => fetch::run(url, headers, cache_key, timeout_secs).await,
        Some(Commands::Extract { file, envelope }) => extract::run(file, envelope),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
