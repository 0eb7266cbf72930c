//! Connectivity probe
//!
//! Decides whether a gallery (or any URL) is reachable from this machine before a long
//! operation starts. An unreachable endpoint is a normal outcome, not an error.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;

use crate::error::{ModkitError, Result};

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    pub url: String,
    /// A success or redirect status was received
    pub reachable: bool,
    /// HTTP status, when any response arrived
    pub status: Option<u16>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    /// Transport error, when no response arrived
    pub error: Option<String>,
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Probe `url` with a HEAD request, retrying as GET when HEAD is not allowed
pub fn probe(url: &str, timeout: Duration) -> Result<ProbeOutcome> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| ModkitError::invalid_argument(format!("cannot build HTTP client: {e}")))?;
    reqwest::Url::parse(url)
        .map_err(|e| ModkitError::invalid_argument(format!("invalid URL '{url}': {e}")))?;

    let start = Instant::now();
    let response = match client.head(url).send() {
        Ok(r) if r.status() == StatusCode::METHOD_NOT_ALLOWED => {
            tracing::debug!(url, "HEAD not allowed, retrying with GET");
            client.get(url).send()
        }
        other => other,
    };
    let elapsed = start.elapsed();

    let outcome = match response {
        Ok(r) => {
            let status = r.status();
            ProbeOutcome {
                url: url.to_string(),
                reachable: status.is_success() || status.is_redirection(),
                status: Some(status.as_u16()),
                elapsed,
                error: None,
            }
        }
        Err(e) => ProbeOutcome {
            url: url.to_string(),
            reachable: false,
            status: None,
            elapsed,
            error: Some(e.to_string()),
        },
    };
    tracing::info!(url, reachable = outcome.reachable, status = ?outcome.status, elapsed = ?outcome.elapsed, "probe finished");
    Ok(outcome)
}
