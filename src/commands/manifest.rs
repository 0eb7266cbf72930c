//! Manifest command implementation

use console::Style;

use crate::cli::manifest::{GetVersionArgs, SetVersionArgs};
use crate::cli::{ManifestArgs, ManifestSubcommand};
use crate::commands::version::encode_parts;
use crate::error::{ModkitError, Result};
use crate::manifest;

/// Run manifest command
pub fn run(args: ManifestArgs) -> Result<()> {
    match args.command {
        ManifestSubcommand::SetVersion(set) => set_version(&set),
        ManifestSubcommand::GetVersion(get) => get_version(&get),
    }
}

fn set_version(args: &SetVersionArgs) -> Result<()> {
    let version = match (&args.version, args.build) {
        (Some(v), _) => v.clone(),
        (None, Some(build)) => encode_parts(build, args.major, args.at, args.three_field)?,
        (None, None) => {
            return Err(ModkitError::invalid_argument(
                "either --version or --build is required",
            ));
        }
    };

    let previous = manifest::patch_file(&args.path, &args.key, &version)?;
    println!(
        "{} {} {} -> {}",
        Style::new().bold().apply_to(args.path.display()),
        args.key,
        previous,
        Style::new().green().apply_to(&version)
    );
    Ok(())
}

fn get_version(args: &GetVersionArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.path).map_err(|e| ModkitError::FileReadFailed {
        path: args.path.display().to_string(),
        reason: e.to_string(),
    })?;
    let version =
        manifest::read_version(&text, &args.key)?.ok_or_else(|| ModkitError::ManifestKeyMissing {
            key: args.key.clone(),
            path: args.path.display().to_string(),
        })?;
    println!("{version}");
    Ok(())
}
