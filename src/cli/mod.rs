//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - version: build version encode/decode
//! - manifest: manifest version patching
//! - git: repository introspection
//! - probe: connectivity probe
//! - bundle: offline bundle stage/export/install
//! - modules: installed module update/cleanup/publish
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod bundle;
pub mod completions;
pub mod git;
pub mod manifest;
pub mod modules;
pub mod probe;
pub mod version;

pub use bundle::{BundleArgs, BundleSubcommand};
pub use completions::CompletionsArgs;
pub use git::{GitArgs, GitSubcommand};
pub use manifest::{ManifestArgs, ManifestSubcommand};
pub use modules::{ModulesArgs, ModulesSubcommand};
pub use probe::ProbeArgs;
pub use version::{VersionArgs, VersionSubcommand};

/// modkit - PowerShell module publishing toolkit
///
/// Build versions, manifest patching, and offline module bundles.
#[derive(Parser, Debug)]
#[command(
    name = "modkit",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "PowerShell module publishing toolkit",
    long_about = "modkit computes time-based build versions, patches module manifests, \
                  and stages offline bundles that install modules on machines without \
                  gallery access.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  modkit version encode --build 1                       \x1b[90m# Build version for now\x1b[0m\n   \
                  modkit manifest set-version Tools.psd1 --build 1      \x1b[90m# Stamp a manifest\x1b[0m\n   \
                  modkit bundle export -r ./share Pester                \x1b[90m# Bundle Pester and its dependencies\x1b[0m\n   \
                  modkit bundle install -r ./share                      \x1b[90m# Install on a disconnected machine\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Settings file (defaults to <config dir>/modkit/modkit.yaml)
    #[arg(long, global = true, env = "MODKIT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Exit non-zero when any item of a batch operation fails
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode and decode time-based build versions
    Version(VersionArgs),

    /// Read and patch the version in a module manifest
    Manifest(ManifestArgs),

    /// Show repository facts for CI scripts
    Git(GitArgs),

    /// Check that the gallery is reachable
    Probe(ProbeArgs),

    /// Stage, export, and install offline bundles
    Bundle(BundleArgs),

    /// Update, clean up, and publish modules
    Modules(ModulesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_version_encode() {
        let cli = Cli::try_parse_from(["modkit", "version", "encode", "--build", "1"]).unwrap();
        match cli.command {
            Commands::Version(VersionArgs {
                command: VersionSubcommand::Encode(args),
            }) => {
                assert_eq!(args.build, 1);
                assert_eq!(args.major, None);
            }
            _ => panic!("Expected version encode command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "modkit",
            "probe",
            "-v",
            "--strict",
            "--config",
            "/tmp/modkit.yaml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.strict);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/modkit.yaml")));
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["modkit"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
