use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::git::DEFAULT_REMOTE;

/// Arguments for the git command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show repository facts:\n    modkit git info\n\n\
                  Machine-readable output:\n    modkit git info --json")]
pub struct GitArgs {
    #[command(subcommand)]
    pub command: GitSubcommand,
}

/// Git subcommands
#[derive(Subcommand, Debug)]
pub enum GitSubcommand {
    /// Top-level directory, current branch, and remote URL
    Info(GitInfoArgs),
}

/// Arguments for git info
#[derive(Parser, Debug)]
pub struct GitInfoArgs {
    /// Directory inside the repository (defaults to current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Remote whose URL to report
    #[arg(long, default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}
