//! Resource command handlers.
//!
//! Each handler builds an [`ApiClient`] from the loaded configuration and
//! prints the result; authentication and token refresh are handled by the
//! client.

use crate::cli::args::GroupScope;
use crate::client::ApiClient;
use crate::config::load_config;
use crate::error::Result;

const MASK: &str = "********";

fn client() -> Result<ApiClient> {
    let config = load_config()?;
    ApiClient::from_config(&config)
}

/// Handles the `secrets orgs list` command.
pub async fn handle_orgs_list() -> Result<()> {
    let orgs = client()?.list_organizations().await?;

    if orgs.is_empty() {
        println!("You are not a member of any organization.");
        return Ok(());
    }

    for org in orgs {
        match org.role {
            Some(role) => println!("  {} ({}) - {role}", org.name, org.id),
            None => println!("  {} ({})", org.name, org.id),
        }
    }

    Ok(())
}

/// Handles the `secrets groups list` command.
pub async fn handle_groups_list(org: &str) -> Result<()> {
    let groups = client()?.list_secret_groups(org).await?;

    if groups.is_empty() {
        println!("No secret groups in '{org}'.");
        return Ok(());
    }

    for group in groups {
        println!("  {} ({})", group.name, group.id);
        if let Some(desc) = group.description {
            println!("    Description: {desc}");
        }
    }

    Ok(())
}

/// Handles the `secrets envs list` command.
pub async fn handle_envs_list(scope: &GroupScope) -> Result<()> {
    let envs = client()?.list_environments(&scope.org, &scope.group).await?;

    if envs.is_empty() {
        println!("No environments in '{}'.", scope.group);
        return Ok(());
    }

    for env in envs {
        println!("  {} ({})", env.name, env.id);
    }

    Ok(())
}

/// Handles the `secrets envs create` command.
pub async fn handle_env_create(scope: &GroupScope, name: &str) -> Result<()> {
    let env = client()?
        .create_environment(&scope.org, &scope.group, name)
        .await?;

    println!("Created environment '{}' ({}).", env.name, env.id);
    Ok(())
}

/// Handles the `secrets secrets list` command.
pub async fn handle_secrets_list(scope: &GroupScope, env: &str, reveal: bool) -> Result<()> {
    let secrets = client()?
        .list_secrets(&scope.org, &scope.group, env, reveal)
        .await?;

    if secrets.is_empty() {
        println!("No secrets in '{env}'.");
        return Ok(());
    }

    for secret in secrets {
        let value = match (&secret.value, reveal) {
            (Some(value), true) => value.as_str(),
            _ => MASK,
        };
        println!("  {}={value}", secret.key);
    }

    Ok(())
}

/// Handles the `secrets secrets set` command.
pub async fn handle_secret_set(scope: &GroupScope, env: &str, key: &str, value: &str) -> Result<()> {
    let secret = client()?
        .set_secret(&scope.org, &scope.group, env, key, value)
        .await?;

    match secret.version {
        Some(version) => println!("Saved '{}' (version {version}).", secret.key),
        None => println!("Saved '{}'.", secret.key),
    }

    Ok(())
}
