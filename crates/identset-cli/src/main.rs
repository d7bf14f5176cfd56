//! identset CLI - structural identity digests and de-duplication for JSON documents.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use identset_canonical::DigestAlg;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{canonicalize, dedupe, identity, EngineOptions};

#[derive(Parser)]
#[command(name = "identset")]
#[command(about = "Structural identity digests and de-duplication for JSON documents")]
struct Cli {
    /// Digest algorithm (sha-256 or sha-512); overrides the config file
    #[arg(long, global = true, value_parser = parse_alg)]
    alg: Option<DigestAlg>,
    /// Identity configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the identity digest of a JSON document
    Identity {
        /// Input JSON file (or stdin if not provided)
        input: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show canonical bytes (hex) for a JSON document
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<PathBuf>,
    },
    /// Remove structural duplicates from a JSON array
    Dedupe {
        /// Input JSON file (or stdin if not provided)
        input: Option<PathBuf>,
        /// Report how many times each element occurred
        #[arg(long)]
        counts: bool,
    },
}

fn parse_alg(name: &str) -> Result<DigestAlg, String> {
    DigestAlg::parse(name).map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = EngineOptions {
        alg: cli.alg,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::Identity { input, json } => identity::run(&options, input, json),
        Commands::Canonicalize { input } => canonicalize::run(&options, input),
        Commands::Dedupe { input, counts } => dedupe::run(&options, input, counts),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
