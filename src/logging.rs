//! Diagnostic logging setup
//!
//! Logs go to stderr so stdout stays clean for command output. `MODKIT_LOG` takes
//! `EnvFilter` directives and overrides the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives
pub const LOG_ENV: &str = "MODKIT_LOG";

/// Default directive for the given verbosity
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "modkit=debug,warn" } else { "warn" }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber; later calls are no-ops
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
