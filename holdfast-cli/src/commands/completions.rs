//! Shell completion generation command.

use crate::cli::Cli;
use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

/// Installed binary name.
const BIN_NAME: &str = "holdfast";

/// Generate shell completion scripts
#[derive(Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Execute the completions command.
    pub fn execute(&self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut cmd = Cli::command();

        if !global.quiet {
            eprintln!("# Generating {} completion script", self.shell);
            match self.shell {
                Shell::Bash => {
                    eprintln!(
                        "#   holdfast completions bash > \
                         ~/.local/share/bash-completion/completions/holdfast"
                    );
                }
                Shell::Zsh => {
                    eprintln!("#   holdfast completions zsh > ~/.zsh/completions/_holdfast");
                }
                Shell::Fish => {
                    eprintln!(
                        "#   holdfast completions fish > ~/.config/fish/completions/holdfast.fish"
                    );
                }
                Shell::PowerShell => {
                    eprintln!("#   holdfast completions powershell > $PROFILE");
                }
                _ => {}
            }
        }

        generate(self.shell, &mut cmd, BIN_NAME, &mut io::stdout());

        Ok(())
    }
}
