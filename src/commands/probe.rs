//! Probe command implementation

use console::Style;

use crate::cli::ProbeArgs;
use crate::commands::Context;
use crate::error::{ModkitError, Result};
use crate::probe::probe;

/// Run probe command; an unreachable endpoint is an error so the exit code reflects it
pub fn run(ctx: &Context, args: ProbeArgs) -> Result<()> {
    let url = args.url.unwrap_or_else(|| ctx.settings.gallery_url.clone());
    let timeout = args
        .timeout
        .map_or_else(|| ctx.settings.probe_timeout(), std::time::Duration::from_secs);

    let outcome = probe(&url, timeout)?;
    if outcome.reachable {
        println!(
            "{} {} ({}, {} ms)",
            Style::new().green().bold().apply_to("reachable"),
            outcome.url,
            outcome.status.unwrap_or_default(),
            outcome.elapsed.as_millis()
        );
        return Ok(());
    }

    let detail = match (outcome.status, outcome.error) {
        (Some(status), _) => format!("HTTP {status}"),
        (None, Some(error)) => error,
        (None, None) => "no response".to_string(),
    };
    Err(ModkitError::Unreachable { url, detail })
}
