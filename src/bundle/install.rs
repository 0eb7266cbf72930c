//! Installing from a bundle on a disconnected machine
//!
//! ```text
//! Start → BootstrapProvider → RegisterTempSource → InstallPriority → InstallRemaining
//!                                     │                                     │
//!                                     └──────── UnregisterTempSource ◄──────┘ (always)
//! ```
//!
//! Everything before registration is a precondition and fails fast. The provider
//! bootstrap is the only earlier change to the machine, so it runs after every check. From registration
//! on, the source is held by a [`TempSource`] guard, so it is unregistered on every exit
//! path. Individual package failures are collected in the report.

use std::path::{Path, PathBuf};

use crate::common::fs::{copy_dir_recursive, is_non_empty_dir};
use crate::config::BundleManifest;
use crate::error::{ModkitError, Result};
use crate::gallery::PackageVersion;
use crate::host::{InstallRequest, PackageHost, ProviderLocations, Scope, TempSource};
use crate::progress::{self, ProgressDisplay};

use super::{BundleEnv, BundleLayout, InstallReport, PRIORITY_PACKAGES, VersionOverrides};

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub scope: Scope,
    /// Host runtime major version the bundle is meant for
    pub expected_runtime_major: u32,
    /// Explicit versions; otherwise versions recorded in `bundle.yaml` are used
    pub overrides: VersionOverrides,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            scope: Scope::CurrentUser,
            expected_runtime_major: 7,
            overrides: VersionOverrides::default(),
        }
    }
}

/// Install `names` (or the roots recorded in `bundle.yaml` when empty) from `layout`
pub fn install(
    layout: &BundleLayout,
    names: &[String],
    options: &InstallOptions,
    env: &BundleEnv<'_>,
    progress: Option<&ProgressDisplay>,
) -> Result<InstallReport> {
    let span = tracing::info_span!("install", component = "bundle", operation = "install", root = %layout.root().display(), scope = %options.scope);
    let _enter = span.enter();

    let manifest = BundleManifest::load(&layout.manifest_file())?;
    let requested = requested_names(names, manifest.as_ref())?;

    check_preconditions(env.host, options)?;
    let source_dir = source_dir(layout)?;
    let provider_bootstrapped = bootstrap_provider(layout, env.providers, options.scope)?;

    let source = TempSource::register(env.host, &source_dir)?;
    let mut report = InstallReport {
        source_name: source.name().to_string(),
        provider_bootstrapped,
        ..Default::default()
    };

    for name in install_order(&requested, &source_dir) {
        let version = options
            .overrides
            .get(&name)
            .or_else(|| manifest.as_ref().and_then(|m| m.version_of(&name)));
        match install_one(env.host, &name, version, source.name(), options.scope) {
            Ok(()) => report.installed.push(name.clone()),
            Err(e) => {
                tracing::error!(package = %name, error = %e, "install failed");
                report.failed.insert(name.clone(), e.to_string());
            }
        }
        progress::step(progress, &name);
    }

    report.source_unregistered = source.release();
    tracing::info!(
        installed = report.installed.len(),
        failed = report.failed.len(),
        "install finished"
    );
    Ok(report)
}

fn requested_names(names: &[String], manifest: Option<&BundleManifest>) -> Result<Vec<String>> {
    if !names.is_empty() {
        return Ok(names.to_vec());
    }
    match manifest {
        Some(m) if !m.requested.is_empty() => Ok(m.requested.clone()),
        _ => Err(ModkitError::invalid_argument(
            "no package names given and the bundle has no bundle.yaml to read them from",
        )),
    }
}

fn check_preconditions(host: &dyn PackageHost, options: &InstallOptions) -> Result<()> {
    let found = host.runtime_major()?;
    if found != options.expected_runtime_major {
        return Err(ModkitError::RuntimeMismatch {
            expected: options.expected_runtime_major,
            found,
        });
    }
    if options.scope == Scope::AllUsers && !host.is_elevated()? {
        return Err(ModkitError::PermissionDenied {
            message: "installing for AllUsers requires an elevated session".to_string(),
        });
    }
    Ok(())
}

/// Copy the bundled provider into the scope's plugin directory unless a plugin is already present
fn bootstrap_provider(
    layout: &BundleLayout,
    providers: &ProviderLocations,
    scope: Scope,
) -> Result<bool> {
    if providers.is_installed() {
        tracing::debug!("provider plugin already present");
        return Ok(false);
    }

    // Export writes Provider/, stage --include-provider writes Providers/NuGet/
    let Some(bundled) = [layout.provider_dir(), layout.staged_providers_root()]
        .into_iter()
        .find(|dir| is_non_empty_dir(dir))
    else {
        return Err(ModkitError::MissingDependency {
            name: "NuGet provider".to_string(),
            reason: format!(
                "not installed on this machine and {} is missing or empty",
                layout.provider_dir().display()
            ),
        });
    };

    let dest = providers.plugin_dir_for(scope);
    let copied = copy_dir_recursive(&bundled, &dest)
        .map_err(|e| ModkitError::transient_io(&dest, e))?;
    tracing::info!(dest = %dest.display(), files = copied, "bootstrapped provider plugin");
    Ok(true)
}

fn source_dir(layout: &BundleLayout) -> Result<PathBuf> {
    [layout.nuget_dir(), layout.modules_dir()]
        .into_iter()
        .find(|dir| is_non_empty_dir(dir))
        .ok_or_else(|| {
            ModkitError::not_found(format!(
                "package artifacts under {} (expected Nuget/ or Modules/)",
                layout.root().display()
            ))
        })
}

/// Priority packages that were requested or are staged, then the rest in request order
fn install_order(requested: &[String], source_dir: &Path) -> Vec<String> {
    let mut order: Vec<String> = PRIORITY_PACKAGES
        .iter()
        .filter(|p| {
            requested.iter().any(|r| r.eq_ignore_ascii_case(p)) || is_staged(source_dir, p)
        })
        .map(ToString::to_string)
        .collect();

    for name in requested {
        if !order.iter().any(|o| o.eq_ignore_ascii_case(name)) {
            order.push(name.clone());
        }
    }
    order
}

/// `<dir>/<name>.<digit>...nupkg` or a `<dir>/<name>/` directory
fn is_staged(source_dir: &Path, name: &str) -> bool {
    let Ok(entries) = std::fs::read_dir(source_dir) else {
        return false;
    };
    let prefix = format!("{}.", name.to_ascii_lowercase());
    entries.flatten().any(|entry| {
        let Some(file_name) = entry.file_name().to_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        if entry.path().is_dir() {
            return file_name == name.to_ascii_lowercase();
        }
        file_name.ends_with(".nupkg")
            && file_name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
    })
}

fn install_one(
    host: &dyn PackageHost,
    name: &str,
    version: Option<&PackageVersion>,
    source: &str,
    scope: Scope,
) -> Result<()> {
    host.install(&InstallRequest {
        name,
        version,
        source: Some(source),
        scope,
    })
}
