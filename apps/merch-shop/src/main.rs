//! # Merch Shop CLI
//!
//! Runs one command against the shop database and prints the JSON result.
//! Logs go to stderr so stdout stays machine-readable.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use merch_shop::cli::{execute, Cli};
use merch_shop::{ApiError, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging: INFO by default, RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(err.code.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<serde_json::Value, ApiError> {
    let config = AppConfig::load()?;
    debug!(database = %config.database_path, "Configuration loaded");

    let state = AppState::initialize(config).await?;
    let result = execute(&state, cli.command).await;
    state.shutdown().await;
    result
}
