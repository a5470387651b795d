//! Commands that drive a live session against the API.

use super::build_manager;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use auth_session_config::Config;
use auth_session_core::{AuthEvent, LoginCredentials, SessionManager, SessionState, User};
use std::io::{self, Write};
use tracing::{debug, info};
use url::Url;

fn print_signed_in(user: &User, manager: &SessionManager, format: &OutputFormat) {
    let expires_at = manager.store().expires_at();
    match format {
        OutputFormat::Text => {
            output::print_success(&format!("Logged in as {}", user.email), format);
            output::print_row("User ID", &user.id);
            if let Some(name) = &user.display_name {
                output::print_row("Name", name);
            }
            if let Some(exp) = expires_at {
                output::print_row("Expires", &exp.to_rfc3339());
            }
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "status": "success",
            "user": user,
            "expires_at": expires_at,
        })),
    }
}

/// Read a username (prompted if missing) and a hidden password.
///
/// Returns `None` after reporting the problem if either is empty.
fn prompt_credentials(
    username: Option<String>,
    format: &OutputFormat,
) -> Result<Option<LoginCredentials>> {
    let username = match username {
        Some(username) => username,
        None => {
            print!("Username: ");
            io::stdout().flush()?;
            let mut username = String::new();
            io::stdin().read_line(&mut username)?;
            username.trim().to_string()
        }
    };

    if username.is_empty() {
        output::print_error("Username is required", format);
        return Ok(None);
    }

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(None);
    }

    Ok(Some(LoginCredentials::new(username, password)))
}

/// Direct username/password login.
pub async fn login(
    config: &Config,
    provider: &str,
    username: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let Some(credentials) = prompt_credentials(username, format)? else {
        return Ok(());
    };

    let manager = build_manager(config)?;
    match manager.login(provider, &credentials).await {
        Ok(user) => print_signed_in(&user, &manager, format),
        Err(e) => output::print_error(&format!("Login failed: {}", e), format),
    }

    Ok(())
}

/// Complete an identity-provider redirect.
pub async fn callback(config: &Config, redirect: &str, format: &OutputFormat) -> Result<()> {
    let redirect = Url::parse(redirect).context("redirect is not a valid URL")?;
    let manager = build_manager(config)?;

    match manager.complete_redirect(&redirect).await {
        Ok(user) => print_signed_in(&user, &manager, format),
        Err(e) => {
            let hint = match manager.state() {
                SessionState::AuthError(reason) if reason.is_transient() => " (try again)",
                SessionState::AuthError(_) => " (restart the sign-in flow)",
                _ => "",
            };
            output::print_error(&format!("Callback exchange failed: {}{}", e, hint), format);
        }
    }

    Ok(())
}

fn print_event(event: &AuthEvent, format: &OutputFormat) {
    match format {
        OutputFormat::Text => match event {
            AuthEvent::SignedIn { user, credential } => println!(
                "{}  {} (expires {})",
                event.name(),
                user.email,
                credential.expires_at().to_rfc3339()
            ),
            AuthEvent::Failed(reason) => println!("{}  {}", event.name(), reason.message),
            AuthEvent::SignedOut => println!("{}", event.name()),
        },
        OutputFormat::Json => {
            let detail = match event {
                AuthEvent::SignedIn { user, credential } => serde_json::json!({
                    "user": user,
                    "expires_at": credential.expires_at(),
                }),
                AuthEvent::Failed(reason) => serde_json::json!({ "reason": reason }),
                AuthEvent::SignedOut => serde_json::Value::Null,
            };
            println!(
                "{}",
                serde_json::json!({ "event": event.name(), "detail": detail })
            );
        }
    }
}

/// How `watch` obtains its session. The credential lives only in this
/// process, so a session from an earlier `login` cannot be picked up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignIn {
    /// Silent renewal through the server's ambient renewal cookie.
    Restore,
    Password {
        provider: String,
        username: Option<String>,
    },
    Redirect(String),
}

/// Sign in, keep the session renewed, and print events until Ctrl-C.
pub async fn watch(
    config: &Config,
    sign_in: SignIn,
    sign_out_on_exit: bool,
    format: &OutputFormat,
) -> Result<()> {
    let manager = build_manager(config)?;

    let event_format = *format;
    manager
        .notifier()
        .subscribe(move |event| print_event(event, &event_format));

    let signed_in = match sign_in {
        SignIn::Restore => {
            let state = manager.initialize().await?;
            if !state.is_authenticated() {
                output::print_error(
                    "No session to restore; pass --username or --redirect to sign in",
                    format,
                );
            }
            state.is_authenticated()
        }
        SignIn::Password { provider, username } => {
            let Some(credentials) = prompt_credentials(username, format)? else {
                return Ok(());
            };
            match manager.login(&provider, &credentials).await {
                Ok(_) => true,
                Err(e) => {
                    output::print_error(&format!("Login failed: {}", e), format);
                    false
                }
            }
        }
        SignIn::Redirect(redirect) => {
            let redirect = Url::parse(&redirect).context("redirect is not a valid URL")?;
            match manager.complete_redirect(&redirect).await {
                Ok(_) => true,
                Err(e) => {
                    output::print_error(&format!("Callback exchange failed: {}", e), format);
                    false
                }
            }
        }
    };
    if !signed_in {
        return Ok(());
    }

    info!(
        poll_interval_secs = manager.config().poll_interval.as_secs(),
        "Watching session"
    );

    let mut states = manager.watch_state();
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                debug!(state = state.name(), "Session state changed");
                if state == SessionState::Unauthenticated {
                    output::print_error("Session ended", format);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    if sign_out_on_exit && manager.state().is_authenticated() {
        manager.sign_out().await?;
    }
    manager.shutdown();

    Ok(())
}
