use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::host::Scope;

/// Arguments for the modules command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Update modules from the gallery:\n    modkit modules update Pester PSReadLine\n\n\
                  Keep only the newest two versions:\n    modkit modules cleanup Pester --keep 2\n\n\
                  Publish a package:\n    MODKIT_API_KEY=... modkit modules publish ./out/Tools.1.0.20250.0.nupkg")]
pub struct ModulesArgs {
    #[command(subcommand)]
    pub command: ModulesSubcommand,
}

/// Modules subcommands
#[derive(Subcommand, Debug)]
pub enum ModulesSubcommand {
    /// Install newer gallery versions of installed modules
    Update(UpdateArgs),

    /// Remove old installed versions
    Cleanup(CleanupArgs),

    /// Publish a .nupkg to the gallery
    Publish(PublishArgs),
}

/// Arguments for modules update
#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Module names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Installation scope
    #[arg(long, value_enum, default_value_t = Scope::CurrentUser)]
    pub scope: Scope,
}

/// Arguments for modules cleanup
#[derive(Parser, Debug)]
pub struct CleanupArgs {
    /// Module names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Number of newest versions to keep
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub keep: u32,
}

/// Arguments for modules publish
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Package file
    pub path: PathBuf,

    /// API key (defaults to the environment variable named by api_key_env)
    #[arg(long)]
    pub api_key: Option<String>,
}
