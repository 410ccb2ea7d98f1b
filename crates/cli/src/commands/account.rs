//! Session and profile commands.
//!
//! # Usage
//!
//! ```bash
//! cw account login --token <TOKEN> --username ada --email ada@example.com --user-id 1
//! cw account status
//! cw account profile
//! cw account update --first-name Ada --city London
//! cw account logout
//! ```

use cartwheel_client::AccountSummary;
use cartwheel_client::api::ProfileUpdate;
use cartwheel_core::UserId;
use secrecy::SecretString;
use tracing::info;

use super::{CliContext, CliError};

/// Show whether a session is active and for whom.
pub fn status(ctx: &CliContext) {
    if !ctx.session.is_authenticated() {
        info!("Signed out");
        return;
    }
    match ctx.session.account() {
        Some(account) => info!("Signed in as {} <{}>", account.username, account.email),
        None => info!("Signed in (token only)"),
    }
}

/// Show the signed-in account's profile.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
pub async fn profile(ctx: &CliContext) -> Result<(), CliError> {
    let profile = ctx.api.profile().await?;

    info!("#{} {} <{}>", profile.id, profile.username, profile.email);
    if let (Some(first), Some(last)) = (&profile.first_name, &profile.last_name) {
        info!("  Name: {first} {last}");
    }
    if let Some(phone) = &profile.phone_number {
        info!("  Phone: {phone}");
    }
    if let Some(date_of_birth) = profile.date_of_birth {
        info!("  Date of birth: {date_of_birth}");
    }
    if let Some(address) = &profile.address {
        let city = profile.city.as_deref().unwrap_or("");
        let state = profile.state.as_deref().unwrap_or("");
        let zip = profile.zip_code.as_deref().unwrap_or("");
        let country = profile.country.as_deref().unwrap_or("");
        info!("  Address: {address}, {city} {state} {zip}, {country}");
    }
    Ok(())
}

/// Apply the given profile fields; `None` fields are left unchanged.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
pub async fn update(ctx: &CliContext, update: ProfileUpdate) -> Result<(), CliError> {
    let profile = ctx.api.update_profile(&update).await?;
    info!("Profile updated for {}", profile.username);
    Ok(())
}

/// Sign in with a bearer token, optionally recording who it belongs to.
///
/// # Errors
///
/// Returns an error if the session cannot be persisted.
pub fn login(
    ctx: &CliContext,
    token: String,
    username: Option<String>,
    email: Option<String>,
    user_id: Option<i64>,
) -> Result<(), CliError> {
    let account = match (username, email, user_id) {
        (Some(username), Some(email), Some(id)) => Some(AccountSummary {
            id: UserId::new(id),
            username,
            email,
        }),
        _ => None,
    };
    ctx.session.login(SecretString::from(token), account)?;
    info!("Signed in");
    Ok(())
}

/// Sign out and clear the persisted token and account.
///
/// # Errors
///
/// Returns an error if the state file cannot be written.
pub fn logout(ctx: &CliContext) -> Result<(), CliError> {
    ctx.session.logout()?;
    info!("Signed out");
    Ok(())
}
