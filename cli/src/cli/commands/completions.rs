//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::args::{Cli, ShellType};
use crate::error::Result;

/// Handles the `secrets completions <shell>` command.
///
/// Generates shell completion scripts.
pub fn handle_completions(shell: ShellType) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
    };

    generate(shell, &mut cmd, "secrets", &mut std::io::stdout());

    Ok(())
}
