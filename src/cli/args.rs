//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    add::AddArgs,
    completions::CompletionsArgs,
    config::ConfigCommands,
    delete::DeleteArgs,
    edit::{SetArgs, ToggleArgs},
    export::ExportArgs,
    init::InitArgs,
    load::LoadArgs,
    overrides::OverridesCommands,
    show::ShowArgs,
    summary::SummaryArgs,
};

#[derive(Parser)]
#[command(name = "mtrack")]
#[command(author, version, about = "Construction milestone tracker")]
#[command(long_about = "Track per-project installation milestones against a project-management backend. Checkpoint edits recompute progress locally and are kept until the backend confirms them.")]
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

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .mtrack/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new mtrack workspace
    Init(InitArgs),

    /// Load the milestone grid and list rows
    #[command(visible_alias = "list")]
    Load(LoadArgs),

    /// Show one row with every checkpoint
    Show(ShowArgs),

    /// Set one cell of a row
    Set(SetArgs),

    /// Flip one checkpoint of a row
    Toggle(ToggleArgs),

    /// Add a row with default values
    Add(AddArgs),

    /// Delete a row
    Delete(DeleteArgs),

    /// Export rows to CSV
    Export(ExportArgs),

    /// Show progress summary across all rows
    Summary(SummaryArgs),

    /// List milestone groups and checkpoint fields
    Columns,

    /// Inspect or clear edits waiting to be saved
    #[command(subcommand)]
    Overrides(OverridesCommands),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
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
    /// Just IDs, one per line
    Id,
}
