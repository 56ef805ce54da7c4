//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    compare::CompareArgs,
    completions::CompletionsArgs,
    config::ConfigCommands,
    credit::CreditArgs,
    ingest::IngestArgs,
    init::InitArgs,
    map::MapCommands,
    part::PartCommands,
    search::SearchArgs,
    selection::SelectionCommands,
};

#[derive(Parser)]
#[command(name = "sst")]
#[command(author, version, about = "Solar Sales Toolkit")]
#[command(
    long_about = "A command-line toolkit for solar sales engineering: a SQLite parts catalog fed from vendor CSV exports, design pricing comparison against that catalog, and federal tax credit eligibility assessment for proposed systems."
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

    /// Workspace root (default: auto-detect by finding .sst/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new workspace
    Init(InitArgs),

    /// Import a vendor CSV export into the parts catalog
    Ingest(IngestArgs),

    /// Search the parts catalog
    Search(SearchArgs),

    /// Inspect catalog parts
    #[command(subcommand)]
    Part(PartCommands),

    /// Manage component-name-to-SKU mappings
    #[command(subcommand)]
    Map(MapCommands),

    /// Compare design pricing against catalog domesticity data
    Compare(CompareArgs),

    /// Assess federal tax credit eligibility for a part selection
    Credit(CreditArgs),

    /// Manage part selection files
    #[command(subcommand)]
    Selection(SelectionCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
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
    /// Just SKUs, one per line
    Id,
}
