//! Shell completion generation
//!
//! Writes a completion script for the requested shell to stdout. Bash and
//! zsh users source it directly (`source <(stocktake completions bash)`);
//! fish wants it redirected to
//! `~/.config/fish/completions/stocktake.fish`.

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
    generate(args.shell, &mut cmd, "stocktake", &mut io::stdout());
    Ok(())
}
