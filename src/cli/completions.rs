use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    modkit completions bash > ~/.bash_completion.d/modkit\n\n\
                  Generate zsh completions:\n    modkit completions zsh > ~/.zfunc/_modkit\n\n\
                  Generate fish completions:\n    modkit completions fish > ~/.config/fish/completions/modkit.fish\n\n\
                  Generate PowerShell completions:\n    modkit completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
