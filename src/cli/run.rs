//! Run one npm command through the facade.
//!
//! The command is resolved against the discovered registry, so both the npm name
//! and the method identifier work:
//!
//! ```bash
//! npmcall run install left-pad --save-dev
//! npmcall run dist-tag ls left-pad
//! npmcall run distTag ls left-pad
//! ```
//!
//! Everything after the command is passed to npm as separate words, quoted for
//! the shell where needed.

use anyhow::{Context, Result};
use clap::Args;

use crate::npm::Npm;

/// Command to run a discovered npm command.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// npm command name (`dist-tag`) or method identifier (`distTag`)
    command: String,

    /// Parameters passed to npm unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    params: Vec<String>,
}

impl RunCommand {
    /// Runs the command in the instance directory and prints npm's output.
    ///
    /// When npm's output was already echoed (`--no-silent`) it is not printed again.
    pub async fn execute(self, npm: &Npm) -> Result<()> {
        let params = self.params()?;
        let output = npm.call(&self.command, params.as_deref()).await?;

        if npm.options().exec_settings().silent {
            let output = output.trim_end();
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Ok(())
    }

    fn params(&self) -> Result<Option<String>> {
        if self.params.is_empty() {
            return Ok(None);
        }
        let joined = shlex::try_join(self.params.iter().map(String::as_str))
            .context("Parameters cannot be passed to the shell")?;
        Ok(Some(joined))
    }
}
