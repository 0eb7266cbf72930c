//! Partial-failure accounting for batch operations

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Outcome of a best-effort operation over a list of named items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    /// Items left alone: already in place, or nothing to act on
    pub skipped: Vec<String>,
    /// Item name to the reason it failed
    pub failed: BTreeMap<String, String>,
    /// Files written to disk (copies and downloads)
    pub files_written: u64,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(&mut self, name: impl Into<String>) {
        self.succeeded.push(name.into());
    }

    pub fn skip(&mut self, name: impl Into<String>, reason: &str) {
        let name = name.into();
        tracing::info!(item = %name, reason, "skipped");
        self.skipped.push(name);
    }

    pub fn fail(&mut self, name: impl Into<String>, error: impl fmt::Display) {
        let name = name.into();
        let reason = error.to_string();
        tracing::error!(item = %name, error = %reason, "failed");
        self.failed.insert(name, reason);
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of `bundle install`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub failed: BTreeMap<String, String>,
    /// Name the bundle was registered under while installing
    pub source_name: String,
    pub source_unregistered: bool,
    /// The provider plugin was copied from the bundle onto this machine
    pub provider_bootstrapped: bool,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.source_unregistered
    }
}
