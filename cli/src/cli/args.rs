//! Command-line argument parsing.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line client for the secrets service.
///
/// Log in once with `secrets auth login`; every other command reuses the
/// stored session and refreshes it when it expires.
#[derive(Parser, Debug)]
#[command(name = "secrets")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage authentication.
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Manage organizations.
    Orgs {
        #[command(subcommand)]
        command: OrgCommands,
    },

    /// Manage secret groups.
    Groups {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Manage environments of a secret group.
    Envs {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Read and write secrets.
    Secrets {
        #[command(subcommand)]
        command: SecretCommands,
    },

    /// Generate shell completion scripts.
    ///
    /// Outputs completion script for the specified shell.
    /// Follow shell-specific instructions to install.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

/// Supported shell types for completions.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

/// Authentication subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in with a one-time code entered in the browser.
    Login {
        /// Skip opening the browser automatically.
        #[arg(long)]
        no_browser: bool,
    },

    /// Log out and remove stored credentials.
    Logout,

    /// Show current authentication status.
    Status,
}

/// Organization subcommands.
#[derive(Subcommand, Debug)]
pub enum OrgCommands {
    /// List organizations you belong to.
    List,
}

/// Secret group subcommands.
#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// List secret groups of an organization.
    List {
        /// Organization ID or slug.
        #[arg(long, env = "SECRETS_ORG")]
        org: String,
    },
}

/// Organization and secret group a command operates on.
#[derive(Args, Debug, Clone)]
pub struct GroupScope {
    /// Organization ID or slug.
    #[arg(long, env = "SECRETS_ORG")]
    pub org: String,

    /// Secret group ID or slug.
    #[arg(long, env = "SECRETS_GROUP")]
    pub group: String,
}

/// Environment subcommands.
#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// List environments of a secret group.
    List {
        #[command(flatten)]
        scope: GroupScope,
    },

    /// Create an environment.
    Create {
        #[command(flatten)]
        scope: GroupScope,

        /// Name of the new environment.
        name: String,
    },
}

/// Secret subcommands.
#[derive(Subcommand, Debug)]
pub enum SecretCommands {
    /// List secrets of an environment.
    List {
        #[command(flatten)]
        scope: GroupScope,

        /// Environment name or ID.
        #[arg(short, long, env = "SECRETS_ENV")]
        env: String,

        /// Show secret values instead of masking them.
        #[arg(long)]
        reveal: bool,
    },

    /// Create or update a secret.
    Set {
        #[command(flatten)]
        scope: GroupScope,

        /// Environment name or ID.
        #[arg(short, long, env = "SECRETS_ENV")]
        env: String,

        /// Secret key.
        key: String,

        /// Secret value.
        value: String,
    },
}
