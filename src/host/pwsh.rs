//! [`PackageHost`] backed by a PowerShell child process
//!
//! Every call runs one short script through `pwsh -NoProfile -NonInteractive -Command`.
//! Arguments are embedded as single-quoted PowerShell literals.

use std::path::Path;
use std::process::Command;

use super::{InstallRequest, PackageHost};
use crate::config::Settings;
use crate::error::{ModkitError, Result};

const ELEVATION_CHECK: &str = "if ($IsWindows -or $PSVersionTable.PSEdition -eq 'Desktop') { \
     ([Security.Principal.WindowsPrincipal][Security.Principal.WindowsIdentity]::GetCurrent()).IsInRole([Security.Principal.WindowsBuiltInRole]::Administrator) \
     } else { (id -u) -eq 0 }";

/// Quote `value` as a PowerShell single-quoted string literal
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Host package manager driven through `pwsh`
#[derive(Debug, Clone)]
pub struct PwshHost {
    executable: String,
}

impl PwshHost {
    pub fn new(settings: &Settings) -> Self {
        Self {
            executable: settings.powershell.clone(),
        }
    }

    fn run(&self, script: &str) -> Result<String> {
        tracing::debug!(executable = %self.executable, script, "running host command");
        let output = Command::new(&self.executable)
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()
            .map_err(|e| ModkitError::host(format!("failed to start {}: {e}", self.executable)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModkitError::host(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Script for `Install-Module` with the request's parameters
pub fn install_script(request: &InstallRequest<'_>) -> String {
    let mut script = format!(
        "Install-Module -Name {} -Scope {} -Force -AllowClobber -SkipPublisherCheck -ErrorAction Stop",
        ps_quote(request.name),
        request.scope
    );
    if let Some(version) = request.version {
        script.push_str(&format!(" -RequiredVersion {}", ps_quote(&version.to_string())));
    }
    if let Some(source) = request.source {
        script.push_str(&format!(" -Repository {}", ps_quote(source)));
    }
    script
}

impl PackageHost for PwshHost {
    fn runtime_major(&self) -> Result<u32> {
        let out = self.run("$PSVersionTable.PSVersion.Major")?;
        out.parse()
            .map_err(|_| ModkitError::host(format!("unexpected runtime version output '{out}'")))
    }

    fn is_elevated(&self) -> Result<bool> {
        let out = self.run(ELEVATION_CHECK)?;
        Ok(out.eq_ignore_ascii_case("true"))
    }

    fn register_source(&self, name: &str, location: &Path) -> Result<()> {
        let location = location.display().to_string();
        self.run(&format!(
            "Register-PSRepository -Name {} -SourceLocation {} -PublishLocation {} -InstallationPolicy Trusted -ErrorAction Stop",
            ps_quote(name),
            ps_quote(&location),
            ps_quote(&location)
        ))
        .map(|_| ())
    }

    fn unregister_source(&self, name: &str) -> Result<()> {
        self.run(&format!(
            "Unregister-PSRepository -Name {} -ErrorAction Stop",
            ps_quote(name)
        ))
        .map(|_| ())
    }

    fn install(&self, request: &InstallRequest<'_>) -> Result<()> {
        self.run(&install_script(request)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Scope;

    #[test]
    fn test_ps_quote_escapes_single_quotes() {
        assert_eq!(ps_quote("plain"), "'plain'");
        assert_eq!(ps_quote("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_install_script_minimal() {
        let script = install_script(&InstallRequest {
            name: "Pester",
            version: None,
            source: None,
            scope: Scope::CurrentUser,
        });
        assert!(script.starts_with("Install-Module -Name 'Pester' -Scope CurrentUser"));
        assert!(!script.contains("-RequiredVersion"));
        assert!(!script.contains("-Repository"));
    }

    #[test]
    fn test_install_script_pinned_to_source() {
        let version = "5.5.0".parse().unwrap();
        let script = install_script(&InstallRequest {
            name: "Pester",
            version: Some(&version),
            source: Some("modkit-offline-abc"),
            scope: Scope::AllUsers,
        });
        assert!(script.contains("-Scope AllUsers"));
        assert!(script.contains("-RequiredVersion '5.5.0'"));
        assert!(script.contains("-Repository 'modkit-offline-abc'"));
    }

    #[test]
    fn test_missing_executable_is_host_error() {
        let host = PwshHost {
            executable: "modkit-definitely-not-a-shell".to_string(),
        };
        let err = host.runtime_major().unwrap_err();
        assert!(matches!(err, ModkitError::Host { .. }));
    }
}
