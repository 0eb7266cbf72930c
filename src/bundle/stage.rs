//! Staging modules into a bundle's `Modules/` tree
//!
//! Staging is idempotent: a destination that already holds files is reported as skipped
//! and left untouched unless `force` is set, in which case it is replaced.

use std::path::Path;

use crate::common::fs::{copy_dir_recursive, is_non_empty_dir};
use crate::error::{ModkitError, Result};
use crate::gallery::{Gallery, PackageVersion, artifact_file_name};
use crate::host::{ModulePaths, ProviderLocations};
use crate::progress::{self, ProgressDisplay};

use super::{BatchReport, BundleEnv, BundleLayout, PROVIDER_REPORT_KEY, VersionOverrides};

/// Where staged modules come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StageSource {
    /// Modules installed on this machine
    #[default]
    Local,
    /// Package artifacts downloaded from the gallery
    Gallery,
}

#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    pub source: StageSource,
    pub overrides: VersionOverrides,
    /// Also copy the NuGet provider plugin into `Providers/`
    pub include_provider: bool,
    /// Provider version to copy; the highest on disk when absent
    pub provider_version: Option<PackageVersion>,
    pub force: bool,
}

/// Stage `names` into `layout`, one item at a time
pub fn stage(
    layout: &BundleLayout,
    names: &[String],
    options: &StageOptions,
    env: &BundleEnv<'_>,
    progress: Option<&ProgressDisplay>,
) -> BatchReport {
    let span = tracing::info_span!("stage", component = "bundle", operation = "stage", root = %layout.root().display());
    let _enter = span.enter();

    let mut report = BatchReport::new();
    for name in names {
        let result = match options.source {
            StageSource::Local => stage_local(layout, name, options, env.modules, &mut report),
            StageSource::Gallery => stage_gallery(layout, name, options, env.gallery, &mut report),
        };
        if let Err(e) = result {
            report.fail(name.as_str(), e);
        }
        progress::step(progress, name);
    }

    if options.include_provider {
        if let Err(e) = stage_provider(layout, options, env.providers, &mut report) {
            report.fail(PROVIDER_REPORT_KEY, e);
        }
    }

    tracing::info!(
        staged = report.succeeded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        files = report.files_written,
        "stage finished"
    );
    report
}

fn stage_local(
    layout: &BundleLayout,
    name: &str,
    options: &StageOptions,
    modules: &ModulePaths,
    report: &mut BatchReport,
) -> Result<()> {
    let wanted = options.overrides.get(name);
    let Some(installed) = modules.find(name, wanted) else {
        let wanted = wanted.map(ToString::to_string);
        tracing::warn!(module = name, version = ?wanted, "module is not installed, skipping");
        report.skip(name, "not installed");
        return Ok(());
    };

    let dest = layout.module_dir(&installed.name, &installed.version);
    if !prepare_destination(&dest, options.force)? {
        report.skip(name, "already staged");
        return Ok(());
    }

    let copied = copy_dir_recursive(&installed.path, &dest)
        .map_err(|e| ModkitError::transient_io(&dest, e))?;
    tracing::debug!(module = name, version = %installed.version, files = copied, "staged module");
    report.files_written += copied;
    report.succeed(name);
    Ok(())
}

fn stage_gallery(
    layout: &BundleLayout,
    name: &str,
    options: &StageOptions,
    gallery: &dyn Gallery,
    report: &mut BatchReport,
) -> Result<()> {
    let package = match gallery.find(name, options.overrides.get(name)) {
        Ok(package) => package,
        Err(ModkitError::NotFound { what }) => {
            tracing::warn!(module = name, %what, "package not in gallery, skipping");
            report.skip(name, "not in gallery");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let dir = layout.module_dir(&package.name, &package.version);
    if !prepare_destination(&dir, options.force)? {
        report.skip(name, "already staged");
        return Ok(());
    }

    let dest = dir.join(artifact_file_name(&package.name, &package.version));
    gallery.download(&package.name, &package.version, &dest)?;
    tracing::debug!(module = name, version = %package.version, "downloaded module artifact");
    report.files_written += 1;
    report.succeed(name);
    Ok(())
}

fn stage_provider(
    layout: &BundleLayout,
    options: &StageOptions,
    providers: &ProviderLocations,
    report: &mut BatchReport,
) -> Result<()> {
    let install = providers
        .find(options.provider_version.as_ref())
        .ok_or_else(|| ModkitError::not_found("NuGet provider plugin on this machine"))?;

    let dest = layout.staged_provider_dir(&install.version);
    if !prepare_destination(&dest, options.force)? {
        report.skip(PROVIDER_REPORT_KEY, "already staged");
        return Ok(());
    }

    let copied = copy_dir_recursive(&install.path, &dest)
        .map_err(|e| ModkitError::transient_io(&dest, e))?;
    report.files_written += copied;
    report.succeed(PROVIDER_REPORT_KEY);
    Ok(())
}

/// Returns `false` when `dest` is already populated and must be left alone
fn prepare_destination(dest: &Path, force: bool) -> Result<bool> {
    if !is_non_empty_dir(dest) {
        return Ok(true);
    }
    if !force {
        return Ok(false);
    }
    std::fs::remove_dir_all(dest).map_err(|e| ModkitError::transient_io(dest, e))?;
    Ok(true)
}
