//! Print the npm binary the facade runs.

use anyhow::Result;
use clap::Args;

use crate::constants::{NOT_FOUND_EXIT_CODE, NPM_BINARY_NAME};
use crate::core::NpmError;
use crate::npm::Npm;

/// Command to print the resolved npm binary.
#[derive(Args, Debug)]
pub struct WhichCommand {}

impl WhichCommand {
    /// Prints the binary path, or fails the way a missing binary fails execution.
    pub fn execute(self, npm: &Npm) -> Result<()> {
        match npm.discovery().binary() {
            Some(path) => {
                println!("{}", path.display());
                Ok(())
            }
            None => Err(NpmError::from_exit(
                NOT_FOUND_EXIT_CODE,
                &format!("{NPM_BINARY_NAME}: command not found"),
            )
            .into()),
        }
    }
}
