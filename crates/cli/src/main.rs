//! Kori CLI - Environment checks and database seeding.
//!
//! # Usage
//!
//! ```bash
//! # Validate the environment
//! kori env
//!
//! # Print the effective configuration with secrets masked
//! kori env --print
//!
//! # Create or update the administrator and the sample client
//! kori seed
//! ```
//!
//! Logs go to stderr so `kori env --print` output can be piped.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use clap::{Parser, Subcommand};
use kori_cli::commands;
use kori_core::KoriConfig;

#[derive(Parser)]
#[command(name = "kori")]
#[command(author, version, about = "Kori CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate environment configuration
    Env {
        /// Print the validated configuration as JSON with secrets masked
        #[arg(long)]
        print: bool,
    },
    /// Seed the administrator account and sample data
    Seed,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kori_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Env { print } => {
            let output = commands::env::run(print)?;
            writeln!(std::io::stdout().lock(), "{output}")?;
        }
        Commands::Seed => {
            let config = KoriConfig::from_env()?;
            commands::seed::run(&config).await?;
        }
    }
    Ok(())
}
