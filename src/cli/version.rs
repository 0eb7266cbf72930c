use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// Arguments for the version command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Build version for the current time:\n    modkit version encode --build 1\n\n\
                  Build version for a given instant:\n    modkit version encode --build 1 --at 2025-01-01T00:00:00Z\n\n\
                  PowerShell-compatible three-field version:\n    modkit version encode --build 1 --three-field\n\n\
                  When was a version built:\n    modkit version decode 1.0.20250.0")]
pub struct VersionArgs {
    #[command(subcommand)]
    pub command: VersionSubcommand,
}

/// Version subcommands
#[derive(Subcommand, Debug)]
pub enum VersionSubcommand {
    /// Encode a timestamp into a build version
    Encode(EncodeArgs),

    /// Decode a build version into the (approximate) time it was built
    Decode(DecodeArgs),
}

/// Arguments for version encode
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// First version field
    #[arg(long)]
    pub build: i32,

    /// Second version field (defaults to 0; not allowed with --three-field)
    #[arg(long, conflicts_with = "three_field")]
    pub major: Option<i32>,

    /// Instant to encode, RFC 3339 (defaults to now)
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: Option<DateTime<Utc>>,

    /// Produce Build.Minor.Revision instead of Build.Major.Minor.Revision
    #[arg(long)]
    pub three_field: bool,
}

/// Arguments for version decode
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Version to decode
    pub version: String,

    /// The version has three fields and was encoded with Major = 0
    #[arg(long)]
    pub three_field: bool,
}
