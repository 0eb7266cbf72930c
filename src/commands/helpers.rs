//! Command helper utilities

use std::path::PathBuf;

use console::Style;

use crate::bundle::{BatchReport, InstallReport};
use crate::error::{ModkitError, Result};
use crate::progress::ProgressDisplay;

/// Resolve a start path from an optional argument
///
/// If a path is provided, use it. Otherwise, resolve to the current directory.
pub fn resolve_start_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => std::env::current_dir().map_err(|e| ModkitError::IoError {
            message: format!("Failed to get current directory: {}", e),
        }),
    }
}

/// Progress bar over `total` items, drawn only when stderr is a terminal
pub fn progress_for(total: usize) -> Option<ProgressDisplay> {
    console::Term::stderr()
        .is_term()
        .then(|| ProgressDisplay::new(total as u64))
}

/// With `--strict`, turn any failed item into an error
pub fn check_strict(strict: bool, operation: &str, failed: usize) -> Result<()> {
    if strict && failed > 0 {
        return Err(ModkitError::Incomplete {
            operation: operation.to_string(),
            failed,
        });
    }
    Ok(())
}

fn print_failures<'a>(failed: impl IntoIterator<Item = (&'a String, &'a String)>) {
    let red = Style::new().red().bold();
    for (name, reason) in failed {
        println!("  {} {} {}", red.apply_to("✗"), name, Style::new().dim().apply_to(reason));
    }
}

/// Print a batch report under `title`
pub fn print_batch_report(title: &str, report: &BatchReport) {
    println!(
        "{} ({} ok, {} skipped, {} failed)",
        Style::new().bold().apply_to(title),
        report.succeeded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    let green = Style::new().green().bold();
    for name in &report.succeeded {
        println!("  {} {}", green.apply_to("✓"), name);
    }
    for name in &report.skipped {
        println!("  {} {}", Style::new().yellow().apply_to("-"), name);
    }
    print_failures(&report.failed);
}

/// Print the outcome of a bundle install
pub fn print_install_report(report: &InstallReport) {
    println!(
        "{} ({} installed, {} failed)",
        Style::new().bold().apply_to("Install"),
        report.installed.len(),
        report.failed.len()
    );
    if report.provider_bootstrapped {
        println!("  NuGet provider copied from the bundle");
    }
    let green = Style::new().green().bold();
    for name in &report.installed {
        println!("  {} {}", green.apply_to("✓"), name);
    }
    print_failures(&report.failed);
    if !report.source_unregistered {
        println!(
            "  {} temporary source {} could not be unregistered; remove it with Unregister-PSRepository",
            Style::new().red().bold().apply_to("!"),
            report.source_name
        );
    }
}
