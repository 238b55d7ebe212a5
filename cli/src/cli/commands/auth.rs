//! Authentication command handlers.

use crate::auth::{Credential, CredentialStorage, DeviceSession};
use crate::client::ApiClient;
use crate::config::load_config;
use crate::error::{CliError, Result};

/// Handle the `secrets auth login` command.
pub async fn handle_login(no_browser: bool) -> Result<()> {
    let config = load_config()?;
    let client = ApiClient::from_config(&config)?;

    println!("Logging in to {}...", config.api.base_url);
    println!();

    let credential = client
        .device_login()
        .login(|session| show_device_code(session, no_browser))
        .await?;

    println!("Authorization received!");
    println!();
    println!("Successfully logged in as {}!", account_label(&credential));

    Ok(())
}

/// Handle the `secrets auth logout` command.
pub async fn handle_logout() -> Result<()> {
    let config = load_config()?;
    let client = ApiClient::from_config(&config)?;

    match client.store().delete() {
        Ok(()) => println!("Successfully logged out."),
        Err(CliError::NotLoggedIn) => println!("Not currently logged in."),
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Handle the `secrets auth status` command.
pub async fn handle_status() -> Result<()> {
    let config = load_config()?;
    let client = ApiClient::from_config(&config)?;

    match client.store().load() {
        Ok(credential) => {
            println!("Logged in");
            println!();
            println!("  Account:    {}", account_label(&credential));
            println!("  API Server: {}", config.api.base_url);
            println!("  Stored in:  {}", client.store().path().display());
        }
        Err(CliError::NotLoggedIn) => {
            println!("Not logged in");
            println!();
            println!("Run 'secrets auth login' to authenticate.");
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

fn show_device_code(session: &DeviceSession, no_browser: bool) {
    println!("To authenticate, please visit:");
    println!();
    println!("  {}", session.verification_uri);
    println!();
    println!("And enter code: {}", session.user_code);
    println!();
    println!(
        "Waiting until {} for approval.",
        session.deadline.format("%H:%M:%S UTC")
    );

    if !no_browser {
        if open::that(session.browser_url()).is_ok() {
            println!("Browser opened automatically.");
        } else {
            println!("Could not open browser. Please visit the URL manually.");
        }
    }
    println!();
    println!("Waiting for authorization...");
}

fn account_label(credential: &Credential) -> String {
    match (credential.name.is_empty(), credential.email.is_empty()) {
        (false, false) => format!("{} <{}>", credential.name, credential.email),
        (false, true) => credential.name.clone(),
        (true, false) => credential.email.clone(),
        (true, true) => "unknown account".to_string(),
    }
}
