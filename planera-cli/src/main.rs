//! Planera CLI binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use planera_cli::cli::{Cli, Command};
use planera_cli::error::CliResult;
use planera_cli::{AppContext, config, output, run_with};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Only planning needs the declared schema; the binary has no compiled
    // migrations, so its registry stays empty.
    let entities = match &cli.command {
        Command::Plan => config::load_entities(&cli.schema)?,
        _ => Vec::new(),
    };

    run_with(
        cli,
        AppContext {
            entities,
            registry: Default::default(),
        },
    )
    .await
}
