//! Shell completions generation command.
//!
//! ```bash
//! itf completions bash > ~/.local/share/bash-completion/completions/itf
//! itf completions zsh -o ~/.zsh/completions/_itf
//! ```

use crate::cli::{Cli, CompletionsArgs, ShellType};
use crate::error::{Result, ResultExt};
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;
use tracing::info;

const BIN_NAME: &str = "itf";

/// Execute the completions command.
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn execute(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = convert_shell_type(args.shell);

    if let Some(output_path) = &args.output {
        let mut file = std::fs::File::create(output_path).with_path("create", output_path)?;
        generate(shell, &mut cmd, BIN_NAME, &mut file);
        info!(path = %output_path.display(), "Wrote completion script");
    } else {
        generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
    }

    Ok(())
}

const fn convert_shell_type(shell: ShellType) -> Shell {
    match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
        ShellType::PowerShell => Shell::PowerShell,
        ShellType::Elvish => Shell::Elvish,
    }
}
