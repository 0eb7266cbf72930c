//! Modules command implementation

use console::Style;

use crate::cli::{ModulesArgs, ModulesSubcommand};
use crate::commands::Context;
use crate::commands::helpers::{check_strict, print_batch_report, progress_for};
use crate::error::Result;
use crate::gallery::NugetGallery;
use crate::host::{ModulePaths, PwshHost};
use crate::maintenance;

/// Run modules command
pub fn run(ctx: &Context, args: ModulesArgs) -> Result<()> {
    match args.command {
        ModulesSubcommand::Update(update) => {
            let gallery = NugetGallery::new(&ctx.settings)?;
            let host = PwshHost::new(&ctx.settings);
            let modules = ModulePaths::detect();

            let progress = progress_for(update.names.len());
            let report = maintenance::update(
                &update.names,
                update.scope,
                &gallery,
                &host,
                &modules,
                progress.as_ref(),
            );
            if let Some(p) = &progress {
                p.finish();
            }
            print_batch_report("Update", &report);
            check_strict(ctx.strict, "update", report.failed.len())
        }
        ModulesSubcommand::Cleanup(cleanup) => {
            let modules = ModulePaths::detect();
            let report = maintenance::cleanup(&cleanup.names, cleanup.keep as usize, &modules)?;
            print_batch_report("Cleanup", &report);
            check_strict(ctx.strict, "cleanup", report.failed.len())
        }
        ModulesSubcommand::Publish(publish) => {
            let api_key = maintenance::resolve_api_key(publish.api_key.as_deref(), &ctx.settings)?;
            let gallery = NugetGallery::new(&ctx.settings)?;
            maintenance::publish(&publish.path, &api_key, &gallery)?;
            println!(
                "{} {}",
                Style::new().green().bold().apply_to("Published"),
                publish.path.display()
            );
            Ok(())
        }
    }
}
