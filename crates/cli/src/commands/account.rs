//! Session and ticket commands.
//!
//! Passwords are prompted for without echo on a terminal. Piped stdin is
//! read as the password, so it stays out of shell history:
//!
//! ```bash
//! echo "$PASSWORD" | luma login -u ana
//! ```

use std::io::{BufRead, IsTerminal};

use luma_core::Email;
use luma_storefront::error::AppError;
use secrecy::SecretString;

use super::{CliError, Context};
use crate::output;

async fn read_password() -> Result<SecretString, CliError> {
    let password = tokio::task::spawn_blocking(|| {
        if std::io::stdin().is_terminal() {
            rpassword::prompt_password("Senha: ").map(SecretString::from)
        } else {
            password_from(&mut std::io::stdin().lock())
        }
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(password)
}

/// One password line from a non-terminal reader, without its line ending.
fn password_from(reader: &mut impl BufRead) -> std::io::Result<SecretString> {
    rpassword::read_password_from_bufread(reader).map(SecretString::from)
}

pub async fn login(ctx: &Context, username: &str) -> Result<(), CliError> {
    let password = read_password().await?;
    let profile = ctx.client.login(username, &password).await?;
    output::line(&format!("Bem-vindo(a), {}!", profile.username));
    Ok(())
}

pub async fn register(ctx: &Context, username: &str, email: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(AppError::from)?;
    let password = read_password().await?;
    let profile = ctx.client.register(username, &email, &password).await?;
    output::line(&format!("Conta criada. Bem-vindo(a), {}!", profile.username));
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.client.logout().await?;
    output::line("Sessão encerrada.");
    Ok(())
}

/// Show the cached profile, refreshing it from the backend when possible.
pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    if !ctx.client.is_authenticated().await {
        return Err(luma_storefront::api::ApiError::NotAuthenticated.into());
    }

    let profile = match ctx.client.profile().await {
        Ok(profile) => profile,
        Err(e) if e.is_session_error() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Profile refresh failed, showing cached profile");
            ctx.client.cached_user()?.ok_or(e)?
        }
    };
    output::user(&profile);
    Ok(())
}

pub async fn tickets(ctx: &Context) -> Result<(), CliError> {
    let tickets = ctx.client.user_tickets().await?;
    output::tickets(&tickets);
    Ok(())
}
