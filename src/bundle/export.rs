//! Exporting a bundle on a connected machine
//!
//! Resolves the dependency closure, downloads every raw package artifact into `Nuget/`,
//! mirrors the provider plugin into `Provider/`, and writes `bundle.yaml` plus the
//! generated installer.

use std::path::PathBuf;

use crate::common::fs::copy_dir_recursive;
use crate::config::{BundleManifest, BundlePackage};
use crate::error::Result;
use crate::gallery::Gallery;
use crate::host::ProviderLocations;
use crate::host::provider::PLUGIN_DIR;
use crate::progress::{self, ProgressDisplay};

use super::{
    BatchReport, BundleEnv, BundleLayout, ResolvedPackage, ResolvedPackageSet, VersionOverrides,
    resolve_closure,
};
use super::installer_script::{self, InstallerInputs};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub overrides: VersionOverrides,
    /// Re-download artifacts that already exist
    pub force: bool,
    /// Mirror the provider plugin into `Provider/`
    pub include_provider: bool,
    /// PowerShell major version the generated installer requires
    pub runtime_major: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            overrides: VersionOverrides::default(),
            force: false,
            include_provider: true,
            runtime_major: 7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub resolved: ResolvedPackageSet,
    pub downloads: BatchReport,
    /// Provider plugin files copied into `Provider/`
    pub provider_files: u64,
    pub manifest: PathBuf,
    pub installer: PathBuf,
}

/// Export `names` and their dependencies into `layout`
///
/// Per-package download failures are collected in [`ExportOutcome::downloads`].
/// Only failing to write the manifest or installer aborts the export.
pub fn export(
    layout: &BundleLayout,
    names: &[String],
    options: &ExportOptions,
    env: &BundleEnv<'_>,
    progress: Option<&ProgressDisplay>,
) -> Result<ExportOutcome> {
    let span = tracing::info_span!("export", component = "bundle", operation = "export", root = %layout.root().display());
    let _enter = span.enter();

    let resolved = resolve_closure(env.gallery, names, &options.overrides);
    let mut downloads = BatchReport::new();
    for (root, reason) in &resolved.unresolved {
        downloads.fail(root.as_str(), reason);
    }

    std::fs::create_dir_all(layout.nuget_dir())?;
    let mut packages = Vec::with_capacity(resolved.len());
    for package in resolved.iter() {
        if let Some(recorded) = download(layout, package, options.force, env.gallery, &mut downloads) {
            packages.push(recorded);
        }
        progress::step(progress, &package.name);
    }

    let provider_files = if options.include_provider {
        mirror_provider(layout, env.providers)
    } else {
        0
    };

    let manifest = BundleManifest {
        requested: names.to_vec(),
        packages,
        exported_at: Some(chrono::Utc::now().to_rfc3339()),
    };
    manifest.save(&layout.manifest_file())?;
    installer_script::write(
        &layout.installer_script(),
        &InstallerInputs {
            packages: names,
            versions: &manifest.packages,
            runtime_major: options.runtime_major,
        },
    )?;

    tracing::info!(
        packages = resolved.len(),
        downloaded = downloads.succeeded.len(),
        failed = downloads.failed.len(),
        "export finished"
    );
    Ok(ExportOutcome {
        resolved,
        downloads,
        provider_files,
        manifest: layout.manifest_file(),
        installer: layout.installer_script(),
    })
}

fn download(
    layout: &BundleLayout,
    package: &ResolvedPackage,
    force: bool,
    gallery: &dyn Gallery,
    report: &mut BatchReport,
) -> Option<BundlePackage> {
    let version = match &package.version {
        Some(v) => v.clone(),
        None => match gallery.find(&package.name, None) {
            Ok(found) => found.version,
            Err(e) => {
                report.fail(package.name.as_str(), e);
                return None;
            }
        },
    };
    let recorded = BundlePackage {
        name: package.name.clone(),
        version: Some(version.clone()),
    };

    let dest = layout.artifact_path(&package.name, &version);
    if dest.is_file() && !force {
        report.skip(package.name.as_str(), "already downloaded");
        return Some(recorded);
    }

    match gallery.download(&package.name, &version, &dest) {
        Ok(()) => {
            report.files_written += 1;
            report.succeed(package.name.as_str());
            Some(recorded)
        }
        Err(e) => {
            report.fail(package.name.as_str(), e);
            None
        }
    }
}

/// Copy the plugin directory of every known location into `Provider/`
///
/// Locations are copied in reverse search order so the preferred location wins when
/// two hold the same file.
fn mirror_provider(layout: &BundleLayout, providers: &ProviderLocations) -> u64 {
    let dest = layout.provider_dir();
    let mut copied = 0;
    for location in providers.search_order().into_iter().rev() {
        let plugin_dir = location.join(PLUGIN_DIR);
        if !plugin_dir.is_dir() {
            continue;
        }
        match copy_dir_recursive(&plugin_dir, &dest) {
            Ok(n) => copied += n,
            Err(e) => {
                tracing::warn!(source = %plugin_dir.display(), error = %e, "failed to mirror provider plugin");
            }
        }
    }
    if copied == 0 {
        tracing::warn!("no provider plugin found to mirror; the bundle needs one on the target machine");
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ModulePaths;
    use crate::test_fixtures::{MockGallery, MockHost, create_temp_dir, write_provider};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn gallery() -> MockGallery {
        MockGallery::new()
            .with_package("Az.Accounts", "2.13.0", &[])
            .with_package("Az.Storage", "6.0.0", &[("Az.Accounts", "2.13.0")])
            .with_package("Pester", "5.5.0", &[])
    }

    #[test]
    fn test_export_writes_full_layout() {
        let temp = create_temp_dir();
        let layout = BundleLayout::new(temp.path().join("share"));
        let providers = ProviderLocations::new(temp.path().join("user"), temp.path().join("machine"));
        write_provider(&providers.current_user, "2.8.5.201");
        write_provider(&providers.all_users, "2.8.5.208");
        let gallery = gallery();
        let host = MockHost::new();
        let modules = ModulePaths::new(Vec::new());
        let env = BundleEnv {
            gallery: &gallery,
            host: &host,
            providers: &providers,
            modules: &modules,
        };

        let outcome = export(
            &layout,
            &names(&["Az.Storage", "Pester"]),
            &ExportOptions::default(),
            &env,
            None,
        )
        .unwrap();

        assert_eq!(outcome.resolved.len(), 3);
        assert!(outcome.downloads.is_success());
        assert!(layout.nuget_dir().join("Az.Accounts.2.13.0.nupkg").is_file());
        assert!(layout.nuget_dir().join("Az.Storage.6.0.0.nupkg").is_file());
        assert!(layout.provider_dir().join("2.8.5.201").is_dir());
        assert!(layout.provider_dir().join("2.8.5.208").is_dir());
        assert_eq!(outcome.provider_files, 2);
        assert!(outcome.installer.is_file());

        let manifest = BundleManifest::load(&outcome.manifest).unwrap().unwrap();
        assert_eq!(manifest.requested, names(&["Az.Storage", "Pester"]));
        assert_eq!(manifest.packages.len(), 3);
        assert!(manifest.exported_at.is_some());

        let script = std::fs::read_to_string(&outcome.installer).unwrap();
        assert!(script.contains("'Az.Accounts' = '2.13.0'"));
        assert!(script.contains("$RuntimeMajor = 7"));
    }

    #[test]
    fn test_reexport_skips_existing_artifacts() {
        let temp = create_temp_dir();
        let layout = BundleLayout::new(temp.path());
        let providers = ProviderLocations::new(temp.path().join("u"), temp.path().join("m"));
        let gallery = gallery();
        let host = MockHost::new();
        let modules = ModulePaths::new(Vec::new());
        let env = BundleEnv {
            gallery: &gallery,
            host: &host,
            providers: &providers,
            modules: &modules,
        };
        let options = ExportOptions::default();

        export(&layout, &names(&["Pester"]), &options, &env, None).unwrap();
        let again = export(&layout, &names(&["Pester"]), &options, &env, None).unwrap();

        assert_eq!(again.downloads.skipped, vec!["Pester"]);
        assert_eq!(gallery.downloads().len(), 1);
    }

    #[test]
    fn test_partial_download_failure_is_reported() {
        let temp = create_temp_dir();
        let layout = BundleLayout::new(temp.path());
        let providers = ProviderLocations::new(temp.path().join("u"), temp.path().join("m"));
        let gallery = gallery().failing_download("Az.Accounts").failing_query("Ghost");
        let host = MockHost::new();
        let modules = ModulePaths::new(Vec::new());
        let env = BundleEnv {
            gallery: &gallery,
            host: &host,
            providers: &providers,
            modules: &modules,
        };

        let outcome = export(
            &layout,
            &names(&["Az.Storage", "Ghost"]),
            &ExportOptions::default(),
            &env,
            None,
        )
        .unwrap();

        assert_eq!(outcome.downloads.succeeded, vec!["Az.Storage"]);
        assert!(outcome.downloads.failed.contains_key("Az.Accounts"));
        assert!(outcome.downloads.failed.contains_key("Ghost"));
        assert_eq!(outcome.provider_files, 0);
        assert!(layout.manifest_file().is_file());
    }
}
