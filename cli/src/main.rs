//! Secrets CLI - command-line client for the secrets service.
//!
//! Authenticates with the OAuth device flow and keeps the session alive by
//! refreshing expired access tokens transparently.

mod auth;
mod cli;
mod client;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    AuthCommands, Cli, Commands, EnvCommands, GroupCommands, OrgCommands, SecretCommands,
};
use crate::config::settings::env;
use crate::error::Result;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL)
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Run the command
    if let Err(e) = run(cli).await {
        tracing::debug!(
            requires_reauth = e.requires_reauth(),
            retriable = e.is_retriable(),
            "command failed"
        );
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Login { no_browser } => cli::commands::handle_login(no_browser).await,
            AuthCommands::Logout => cli::commands::handle_logout().await,
            AuthCommands::Status => cli::commands::handle_status().await,
        },
        Commands::Orgs { command } => match command {
            OrgCommands::List => cli::commands::handle_orgs_list().await,
        },
        Commands::Groups { command } => match command {
            GroupCommands::List { org } => cli::commands::handle_groups_list(&org).await,
        },
        Commands::Envs { command } => match command {
            EnvCommands::List { scope } => cli::commands::handle_envs_list(&scope).await,
            EnvCommands::Create { scope, name } => {
                cli::commands::handle_env_create(&scope, &name).await
            }
        },
        Commands::Secrets { command } => match command {
            SecretCommands::List { scope, env, reveal } => {
                cli::commands::handle_secrets_list(&scope, &env, reveal).await
            }
            SecretCommands::Set {
                scope,
                env,
                key,
                value,
            } => cli::commands::handle_secret_set(&scope, &env, &key, &value).await,
        },
        Commands::Completions { shell } => cli::commands::handle_completions(shell),
    }
}
