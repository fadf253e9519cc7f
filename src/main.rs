// Keyrotator - Application Entry Point
//
// Parses CLI arguments, initializes structured logging, and dispatches to
// the command handler. Key material is never logged at any level.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use keyrotator::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // RUST_LOG=keyrotator=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keyrotator=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
