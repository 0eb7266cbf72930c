//! Shell completions command

use clap::CommandFactory;

use crate::cli::CompletionsArgs;
use crate::error::{ModkitError, Result};

fn parse_shell(name: &str) -> Result<clap_complete::Shell> {
    match name.to_lowercase().as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "elvish" => Ok(clap_complete::Shell::Elvish),
        "fish" => Ok(clap_complete::Shell::Fish),
        "powershell" | "pwsh" => Ok(clap_complete::Shell::PowerShell),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        _ => Err(ModkitError::invalid_argument(format!(
            "unknown shell '{name}'; supported shells: bash, elvish, fish, powershell, zsh"
        ))),
    }
}

/// Generate shell completions
pub fn run(args: CompletionsArgs) -> Result<()> {
    let shell = parse_shell(&args.shell)?;
    let mut cmd = <crate::cli::Cli as CommandFactory>::command();
    clap_complete::generate(shell, &mut cmd, "modkit", &mut std::io::stdout().lock());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_powershell() {
        let args = CompletionsArgs {
            shell: "powershell".to_string(),
        };
        assert!(run(args).is_ok());
    }

    #[test]
    fn test_shell_names() {
        assert_eq!(parse_shell("pwsh").unwrap(), clap_complete::Shell::PowerShell);
        assert_eq!(parse_shell("BASH").unwrap(), clap_complete::Shell::Bash);
        assert_eq!(parse_shell("Zsh").unwrap(), clap_complete::Shell::Zsh);
    }

    #[test]
    fn test_unknown_shell() {
        let err = parse_shell("tcsh").unwrap_err();
        assert!(matches!(err, ModkitError::InvalidArgument { .. }));
    }
}
