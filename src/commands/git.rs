//! Git command implementation

use console::Style;

use crate::cli::{GitArgs, GitSubcommand};
use crate::commands::helpers::resolve_start_path;
use crate::error::Result;
use crate::git;

/// Run git command
pub fn run(args: GitArgs) -> Result<()> {
    match args.command {
        GitSubcommand::Info(info_args) => {
            let start = resolve_start_path(info_args.path)?;
            let info = git::info(&start, &info_args.remote)?;

            if info_args.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }

            let label = Style::new().bold();
            println!("{} {}", label.apply_to("Top level:"), info.top_level.display());
            println!(
                "{} {}",
                label.apply_to("Branch:"),
                info.branch.as_deref().unwrap_or("(detached)")
            );
            println!(
                "{} {}",
                label.apply_to("Remote:"),
                info.remote_url.as_deref().unwrap_or("(none)")
            );
            Ok(())
        }
    }
}
