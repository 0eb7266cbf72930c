use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::manifest::DEFAULT_KEY;

/// Arguments for the manifest command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Stamp a manifest with a build version for now:\n    modkit manifest set-version Tools.psd1 --build 1\n\n\
                  Set an explicit version:\n    modkit manifest set-version Tools.psd1 --version 2.1.0\n\n\
                  Print the current version:\n    modkit manifest get-version Tools.psd1")]
pub struct ManifestArgs {
    #[command(subcommand)]
    pub command: ManifestSubcommand,
}

/// Manifest subcommands
#[derive(Subcommand, Debug)]
pub enum ManifestSubcommand {
    /// Replace the version value, leaving the rest of the file untouched
    SetVersion(SetVersionArgs),

    /// Print the version value
    GetVersion(GetVersionArgs),
}

/// Arguments for manifest set-version
#[derive(Parser, Debug)]
pub struct SetVersionArgs {
    /// Manifest file
    pub path: PathBuf,

    /// Key holding the version
    #[arg(long, default_value = DEFAULT_KEY)]
    pub key: String,

    /// Literal version to write
    #[arg(long, required_unless_present = "build", conflicts_with = "build")]
    pub version: Option<String>,

    /// Encode a build version with this first field
    #[arg(long)]
    pub build: Option<i32>,

    /// Second field of the encoded build version
    #[arg(long, requires = "build", conflicts_with = "three_field")]
    pub major: Option<i32>,

    /// Instant to encode, RFC 3339 (defaults to now)
    #[arg(long, requires = "build", value_name = "TIMESTAMP")]
    pub at: Option<DateTime<Utc>>,

    /// Encode a three-field version
    #[arg(long, requires = "build")]
    pub three_field: bool,
}

/// Arguments for manifest get-version
#[derive(Parser, Debug)]
pub struct GetVersionArgs {
    /// Manifest file
    pub path: PathBuf,

    /// Key holding the version
    #[arg(long, default_value = DEFAULT_KEY)]
    pub key: String,
}
