//! npmcall CLI entry point
//!
//! Runs npm subcommands through the npmcall facade:
//! - `run` - run a discovered command by name or method identifier
//! - `commands` - list the commands the installed npm reports
//! - `which` - show the npm binary in use

use anyhow::Result;
use clap::Parser;
use npmcall::cli;
use npmcall::core::error::user_friendly_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    init_logging(&config.log_level);

    match cli.execute_with_config(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins when set; otherwise the level derived from the flags.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
