use std::io::Read;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "creepy-parser",
    about = "Extract authors, warnings, dates, dialogue and creepiness from narrative text",
    version
)]
struct Cli {
    /// File paths to analyze (reads stdin if none provided)
    files: Vec<String>,

    /// Print single-line JSON instead of pretty-printed output
    #[arg(long)]
    compact: bool,

    /// Wrap each report in a status envelope with a text preview
    #[arg(long)]
    envelope: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if cli.files.is_empty() {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read stdin")?;
        emit(cli, &String::from_utf8_lossy(&bytes))?;
    } else {
        for path in &cli.files {
            let bytes = std::fs::read(path).with_context(|| format!("failed to read {path}"))?;
            tracing::info!(%path, bytes = bytes.len(), "analyzing file");
            emit(cli, &String::from_utf8_lossy(&bytes))?;
        }
    }
    Ok(())
}

fn emit(cli: &Cli, text: &str) -> Result<()> {
    let json = if cli.envelope {
        render(&creepy_parser::envelope(text), cli.compact)?
    } else {
        render(&creepy_parser::analyze(text), cli.compact)?
    };
    println!("{json}");
    Ok(())
}

fn render<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.context("failed to serialize report")
}
