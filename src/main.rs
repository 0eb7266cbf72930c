//! modkit - PowerShell module publishing toolkit
//!
//! Time-based build versions, manifest version patching, and offline module bundles
//! for machines that cannot reach a package gallery.

use clap::Parser;
use std::path::Path;

mod bundle;
mod cli;
mod codec;
mod commands;
mod common;
mod config;
mod error;
mod gallery;
mod git;
mod host;
mod logging;
mod maintenance;
mod manifest;
mod probe;
mod progress;
#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};
use commands::Context;
use config::Settings;
use error::Result;

fn load_context(config: Option<&Path>, strict: bool) -> Result<Context> {
    let settings = Settings::load(config)?;
    tracing::debug!(?settings, "loaded settings");
    Ok(Context { settings, strict })
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    // Commands that never touch settings run even with a broken config file
    match cli.command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Manifest(args) => commands::manifest::run(args),
        Commands::Git(args) => commands::git::run(args),
        Commands::Completions(args) => commands::completions::run(args),
        Commands::Probe(args) => commands::probe::run(&load_context(config, cli.strict)?, args),
        Commands::Bundle(args) => commands::bundle::run(&load_context(config, cli.strict)?, args),
        Commands::Modules(args) => commands::modules::run(&load_context(config, cli.strict)?, args),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
