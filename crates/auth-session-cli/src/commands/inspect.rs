//! Offline credential inspection.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_session_core::claims;
use chrono::Utc;

/// Decode a credential's claims without contacting the server.
///
/// The signature is not checked; the output is for display only.
pub fn inspect(token: &str, format: &OutputFormat) -> Result<()> {
    let claims = match claims::decode(token) {
        Ok(claims) => claims,
        Err(e) => {
            output::print_error(&format!("Malformed token: {}", e), format);
            return Ok(());
        }
    };

    let now = Utc::now();
    let remaining = claims.expires_at.map(|exp| (exp - now).num_seconds());

    match format {
        OutputFormat::Text => {
            output::print_row("Subject", &claims.subject);
            output::print_row("Email", &claims.email);
            output::print_row(
                "Name",
                claims.display_name.as_deref().unwrap_or("(not set)"),
            );
            match (claims.expires_at, remaining) {
                (Some(exp), Some(secs)) if secs > 0 => {
                    output::print_row("Expires", &format!("{} (in {}s)", exp.to_rfc3339(), secs));
                }
                (Some(exp), _) => {
                    output::print_row("Expires", &format!("{} (expired)", exp.to_rfc3339()));
                }
                (None, _) => output::print_row("Expires", "(no exp claim)"),
            }
            println!("\nClaims are unverified; the server checks the signature.");
        }
        OutputFormat::Json => {
            output::print_json(&serde_json::json!({
                "subject": claims.subject,
                "email": claims.email,
                "display_name": claims.display_name,
                "expires_at": claims.expires_at,
                "expires_in_secs": remaining,
                "verified": false,
            }));
        }
    }

    Ok(())
}
