use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::bundle::StageSource;
use crate::host::Scope;

/// Arguments for the bundle command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Export Pester and its dependencies for a disconnected machine:\n    modkit bundle export --root ./share Pester\n\n\
                  Stage locally installed modules and the NuGet provider:\n    modkit bundle stage --root ./share Pester PSReadLine --include-provider\n\n\
                  Install on the disconnected machine:\n    modkit bundle install --root ./share\n\n\
                  Pin versions:\n    modkit bundle export --root ./share Pester --version Pester=5.5.0")]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleSubcommand,
}

/// Bundle subcommands
#[derive(Subcommand, Debug)]
pub enum BundleSubcommand {
    /// Copy modules into <root>/Modules/<name>/<version>/
    Stage(StageArgs),

    /// Download a dependency closure into <root>/Nuget/ with an installer script
    Export(ExportArgs),

    /// Install from a bundle without gallery access
    Install(InstallArgs),
}

/// Arguments for bundle stage
#[derive(Parser, Debug)]
pub struct StageArgs {
    /// Bundle root directory
    #[arg(long, short = 'r')]
    pub root: PathBuf,

    /// Module names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Where modules come from
    #[arg(long, value_enum, default_value_t = StageSource::Local)]
    pub source: StageSource,

    /// Version to use, as NAME=VERSION or VERSION for every name
    #[arg(long = "version", value_name = "SPEC")]
    pub versions: Vec<String>,

    /// Also stage the NuGet provider plugin under Providers/
    #[arg(long)]
    pub include_provider: bool,

    /// Provider version to stage (defaults to the highest found)
    #[arg(long, requires = "include_provider")]
    pub provider_version: Option<String>,

    /// Replace items that are already staged
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// Arguments for bundle export
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Bundle root directory
    #[arg(long, short = 'r')]
    pub root: PathBuf,

    /// Package names; dependencies are added automatically
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Version to use, as NAME=VERSION or VERSION for every name
    #[arg(long = "version", value_name = "SPEC")]
    pub versions: Vec<String>,

    /// Skip mirroring the NuGet provider plugin into Provider/
    #[arg(long)]
    pub no_provider: bool,

    /// Download artifacts again even if present
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// Arguments for bundle install
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Bundle root directory
    #[arg(long, short = 'r')]
    pub root: PathBuf,

    /// Packages to install (defaults to the names recorded in bundle.yaml)
    pub names: Vec<String>,

    /// Installation scope
    #[arg(long, value_enum, default_value_t = Scope::CurrentUser)]
    pub scope: Scope,

    /// Version to install, as NAME=VERSION or VERSION for every name
    #[arg(long = "version", value_name = "SPEC")]
    pub versions: Vec<String>,
}
