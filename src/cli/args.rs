//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, export::ExportArgs, import::ImportCommands, init::InitArgs,
    product::ProductCommands, stats::StatsArgs,
};

#[derive(Parser)]
#[command(name = "stocktake")]
#[command(author, version, about = "Shop inventory toolkit")]
#[command(
    long_about = "Manages a product inventory as a local SQLite database. Products carry a
case-insensitive (name, brand) identity; spreadsheets import in two phases
(preview stages a reconciled plan, commit applies it) and export back out
in the legacy column layout."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .stocktake/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stocktake workspace
    Init(InitArgs),

    /// Product record management
    #[command(subcommand)]
    Product(ProductCommands),

    /// Spreadsheet import (preview, commit, template)
    #[command(subcommand)]
    Import(ImportCommands),

    /// Export the inventory as a spreadsheet
    Export(ExportArgs),

    /// Show the inventory statistics dashboard
    Stats(StatsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tsv for lists)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
