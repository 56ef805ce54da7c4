//! Shell completion generation for bash, zsh, fish, and PowerShell
//!
//! ```bash
//! # Bash / Zsh - add to the shell rc file
//! source <(sst completions bash)
//!
//! # Fish
//! sst completions fish > ~/.config/fish/completions/sst.fish
//!
//! # PowerShell - add to $PROFILE
//! sst completions powershell >> $PROFILE
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "sst", &mut io::stdout());
    Ok(())
}
