//! Manage the global configuration file.
//!
//! ```bash
//! npmcall --registry http://localhost:4873 config init   # seed from the global flags
//! npmcall config show                                      # print it, password masked
//! npmcall config path                                      # where it is read from
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::GlobalConfig;

const MASKED: &str = "********";

/// Command to manage `~/.npmcall/config.toml`.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommands,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Write a config file from `--npm` and the npm flags given with it.
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration in effect.
    Show,

    /// Print the location of the config file.
    Path,
}

impl ConfigCommand {
    /// Runs the subcommand against the file at `config_path` (or its default).
    ///
    /// `seed` is what `init` writes.
    pub async fn execute(&self, config_path: Option<PathBuf>, seed: GlobalConfig) -> Result<()> {
        let location = GlobalConfig::resolve_location(config_path)?;
        match self.command {
            ConfigSubcommands::Init {
                force,
            } => init(&location, &seed, force).await,
            ConfigSubcommands::Show => show(location).await,
            ConfigSubcommands::Path => {
                println!("{}", location.display());
                Ok(())
            }
        }
    }
}

async fn init(location: &std::path::Path, seed: &GlobalConfig, force: bool) -> Result<()> {
    if location.exists() && !force {
        println!("❌ Config already exists at: {}", location.display());
        println!("   Use --force to overwrite");
        return Ok(());
    }

    seed.save_to(location).await?;
    println!("✅ Created config at: {}", location.display());
    Ok(())
}

async fn show(location: PathBuf) -> Result<()> {
    let exists = location.exists();
    let config = masked(GlobalConfig::load_with_optional(Some(location.clone())).await?);

    println!("{}", "npmcall configuration".bold());
    println!("Location: {}\n", location.display());

    if exists {
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        println!("No config file; defaults are in use.");
        println!("\n{}", "Tip:".yellow());
        println!("  Run 'npmcall config init' to create one");
    }
    Ok(())
}

fn masked(mut config: GlobalConfig) -> GlobalConfig {
    if config.options.password.is_some() {
        config.options.password = Some(MASKED.to_string());
    }
    config
}
