//! Bundle command implementation
//!
//! Builds the real collaborators (NuGet gallery client, `pwsh` host, on-disk provider and
//! module locations) from settings and hands them to the bundle operations.

use console::Style;

use crate::bundle::{
    self, BundleEnv, BundleLayout, ExportOptions, InstallOptions, StageOptions, VersionOverrides,
};
use crate::cli::bundle::{ExportArgs, InstallArgs, StageArgs};
use crate::cli::{BundleArgs, BundleSubcommand};
use crate::commands::Context;
use crate::commands::helpers::{check_strict, print_batch_report, print_install_report, progress_for};
use crate::error::Result;
use crate::gallery::NugetGallery;
use crate::host::{ModulePaths, ProviderLocations, PwshHost};

/// Run bundle command
pub fn run(ctx: &Context, args: BundleArgs) -> Result<()> {
    let gallery = NugetGallery::new(&ctx.settings)?;
    let host = PwshHost::new(&ctx.settings);
    let providers = ProviderLocations::detect(&ctx.settings);
    let modules = ModulePaths::detect();
    let env = BundleEnv {
        gallery: &gallery,
        host: &host,
        providers: &providers,
        modules: &modules,
    };

    match args.command {
        BundleSubcommand::Stage(stage_args) => stage(ctx, &env, stage_args),
        BundleSubcommand::Export(export_args) => export(ctx, &env, export_args),
        BundleSubcommand::Install(install_args) => install(ctx, &env, install_args),
    }
}

fn stage(ctx: &Context, env: &BundleEnv<'_>, args: StageArgs) -> Result<()> {
    let options = StageOptions {
        source: args.source,
        overrides: VersionOverrides::parse(&args.versions)?,
        include_provider: args.include_provider,
        provider_version: args.provider_version.as_deref().map(str::parse).transpose()?,
        force: args.force,
    };
    let layout = BundleLayout::new(args.root);

    let progress = progress_for(args.names.len());
    let report = bundle::stage(&layout, &args.names, &options, env, progress.as_ref());
    if let Some(p) = &progress {
        p.finish();
    }

    print_batch_report(&format!("Stage into {}", layout.root().display()), &report);
    check_strict(ctx.strict, "stage", report.failed.len())
}

fn export(ctx: &Context, env: &BundleEnv<'_>, args: ExportArgs) -> Result<()> {
    let options = ExportOptions {
        overrides: VersionOverrides::parse(&args.versions)?,
        force: args.force,
        include_provider: !args.no_provider,
        runtime_major: ctx.settings.expected_runtime_major,
    };
    let layout = BundleLayout::new(args.root);

    let progress = progress_for(args.names.len());
    let outcome = bundle::export(&layout, &args.names, &options, env, progress.as_ref());
    if let Some(p) = &progress {
        match &outcome {
            Ok(_) => p.finish(),
            Err(_) => p.abandon(),
        }
    }
    let outcome = outcome?;

    print_batch_report(
        &format!("Export of {} package(s) into {}", outcome.resolved.len(), layout.root().display()),
        &outcome.downloads,
    );
    let label = Style::new().bold();
    println!("{} {} file(s)", label.apply_to("Provider:"), outcome.provider_files);
    println!("{} {}", label.apply_to("Manifest:"), outcome.manifest.display());
    println!("{} {}", label.apply_to("Installer:"), outcome.installer.display());
    check_strict(ctx.strict, "export", outcome.downloads.failed.len())
}

fn install(ctx: &Context, env: &BundleEnv<'_>, args: InstallArgs) -> Result<()> {
    let options = InstallOptions {
        scope: args.scope,
        expected_runtime_major: ctx.settings.expected_runtime_major,
        overrides: VersionOverrides::parse(&args.versions)?,
    };
    let layout = BundleLayout::new(args.root);

    let progress = progress_for(args.names.len().max(1));
    let report = bundle::install(&layout, &args.names, &options, env, progress.as_ref());
    if let Some(p) = &progress {
        match &report {
            Ok(_) => p.finish(),
            Err(_) => p.abandon(),
        }
    }
    let report = report?;

    print_install_report(&report);
    let failed = report.failed.len() + usize::from(!report.source_unregistered);
    check_strict(ctx.strict, "install", failed)
}
