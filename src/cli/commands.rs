//! List the commands the installed npm reports.
//!
//! ```text
//! Discovered 3 npm commands (/usr/bin/npm)
//!   install
//!   dist-tag   distTag
//!   run-script runScript
//! ```
//!
//! With `--json` the same data is printed as an array of
//! `{"name": ..., "method": ...}` objects, one per registered command name.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::npm::{CommandRegistry, Npm, method_identifier};

/// Command to list discovered npm commands.
#[derive(Args, Debug)]
pub struct CommandsCommand {
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// One discovered command as printed by `--json`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct CommandEntry<'a> {
    name: &'a str,
    method: String,
}

fn entries(registry: &CommandRegistry) -> Vec<CommandEntry<'_>> {
    registry
        .commands()
        .iter()
        .map(|name| CommandEntry {
            name,
            method: method_identifier(name),
        })
        .collect()
}

impl CommandsCommand {
    /// Prints the registry of `npm`.
    pub fn execute(self, npm: &Npm) -> Result<()> {
        let entries = entries(npm.registry());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("{}", "No npm commands discovered.".yellow());
            if npm.discovery().binary().is_none() {
                println!("npm was not found; install Node.js or pass --npm <path>");
            }
            return Ok(());
        }

        let binary = npm
            .discovery()
            .binary()
            .map(|b| b.display().to_string())
            .unwrap_or_default();
        println!(
            "{} ({})",
            format!("Discovered {} npm commands", entries.len()).bold(),
            binary.dimmed()
        );

        let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
        for entry in &entries {
            if entry.method == entry.name {
                println!("  {}", entry.name.green());
            } else {
                println!("  {} {}", format!("{:<width$}", entry.name).green(), entry.method.cyan());
            }
        }
        Ok(())
    }
}
