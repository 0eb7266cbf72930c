//! The host machine's package manager
//!
//! modkit does not install modules itself; it drives the package manager that ships with
//! PowerShell. This module holds the narrow interface to it ([`PackageHost`]) and the
//! pieces that can be answered from the filesystem alone:
//!
//! - [`provider`]: where the NuGet provider plugin lives and which versions exist
//! - [`modules`]: which module versions are installed
//! - [`temp_source`]: scoped registration of a temporary package source

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::gallery::PackageVersion;

pub mod modules;
pub mod provider;
pub mod pwsh;
pub mod temp_source;

pub use modules::ModulePaths;
pub use provider::ProviderLocations;
pub use pwsh::PwshHost;
pub use temp_source::TempSource;

/// Installation scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scope {
    /// Install for the current user only
    CurrentUser,
    /// Install machine-wide (requires elevation)
    AllUsers,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::CurrentUser => write!(f, "CurrentUser"),
            Scope::AllUsers => write!(f, "AllUsers"),
        }
    }
}

/// A single module installation request
#[derive(Debug, Clone, PartialEq)]
pub struct InstallRequest<'a> {
    pub name: &'a str,
    pub version: Option<&'a PackageVersion>,
    /// Registered source to install from; `None` uses the host's default repository
    pub source: Option<&'a str>,
    pub scope: Scope,
}

/// Operations modkit needs from the host package manager
pub trait PackageHost {
    /// Major version of the host PowerShell runtime
    fn runtime_major(&self) -> Result<u32>;

    /// Whether the current process may write machine-wide locations
    fn is_elevated(&self) -> Result<bool>;

    /// Register `location` as a trusted package source called `name`
    fn register_source(&self, name: &str, location: &Path) -> Result<()>;

    /// Remove the package source called `name`
    fn unregister_source(&self, name: &str) -> Result<()>;

    /// Install one module
    fn install(&self, request: &InstallRequest<'_>) -> Result<()>;
}
