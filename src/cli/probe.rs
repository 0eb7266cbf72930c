use clap::Parser;

/// Arguments for the probe command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Probe the configured gallery:\n    modkit probe\n\n\
                  Probe another endpoint with a longer timeout:\n    modkit probe --url https://proxy.example.com/ --timeout 10")]
pub struct ProbeArgs {
    /// URL to probe (defaults to the configured gallery)
    #[arg(long)]
    pub url: Option<String>,

    /// Timeout in seconds (defaults to probe_timeout_secs from settings)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
