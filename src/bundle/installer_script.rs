//! Self-contained installer written into exported bundles
//!
//! The disconnected machine has PowerShell but not modkit, so export renders
//! `Install-FromRepoFolder.ps1` with the package names baked in.

use std::path::Path;

use crate::config::BundlePackage;
use crate::error::{ModkitError, Result};
use crate::host::pwsh::ps_quote;

use super::PRIORITY_PACKAGES;

const TEMPLATE: &str = include_str!("templates/Install-FromRepoFolder.ps1");

/// What the rendered script needs to know about the bundle
#[derive(Debug, Clone, Copy)]
pub struct InstallerInputs<'a> {
    /// Names installed when the script runs without `-Name`
    pub packages: &'a [String],
    /// Exported versions, passed to `Install-Module -RequiredVersion`
    pub versions: &'a [BundlePackage],
    /// Major PowerShell version the script refuses to run without
    pub runtime_major: u32,
}

fn ps_array(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| ps_quote(item))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ps_hashtable(packages: &[BundlePackage]) -> String {
    packages
        .iter()
        .filter_map(|p| {
            p.version
                .as_ref()
                .map(|v| format!("{} = {}", ps_quote(&p.name), ps_quote(&v.to_string())))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Render the installer
pub fn render(inputs: &InstallerInputs<'_>) -> String {
    let packages: Vec<&str> = inputs.packages.iter().map(String::as_str).collect();
    TEMPLATE
        .replace("{{MODKIT_VERSION}}", env!("CARGO_PKG_VERSION"))
        .replace("{{PACKAGES}}", &ps_array(&packages))
        .replace("{{PRIORITY}}", &ps_array(&PRIORITY_PACKAGES))
        .replace("{{VERSIONS}}", &ps_hashtable(inputs.versions))
        .replace("{{RUNTIME_MAJOR}}", &inputs.runtime_major.to_string())
}

/// Render and write the installer to `path`
pub fn write(path: &Path, inputs: &InstallerInputs<'_>) -> Result<()> {
    std::fs::write(path, render(inputs)).map_err(|e| ModkitError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
