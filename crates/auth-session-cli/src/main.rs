//! authsession - drive the auth session core from the command line.

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use auth_session_config::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use commands::session::SignIn;
use tracing::debug;

/// Auth session command-line interface.
#[derive(Parser)]
#[command(name = "authsession")]
#[command(about = "Sign in, complete provider callbacks and keep a session alive")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error). Defaults to the config file's level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to ~/.authsession
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Also append JSONL logs to <base>/logs/authsession.jsonl
    #[arg(long, global = true)]
    log_to_file: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with username and password
    Login {
        /// Provider that checks the password
        #[arg(short, long, default_value = "password")]
        provider: String,
        /// Username (prompted if omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Exchange an identity-provider redirect URL for a session
    Callback {
        /// Full redirect URL, including its query string
        url: String,
    },

    /// Decode a credential locally (claims are not verified)
    Inspect {
        /// Bearer credential
        token: String,
    },

    /// Sign in (or renew silently) and keep the session renewed until Ctrl-C
    Watch {
        /// Sign in with a password for this user first (password is prompted)
        #[arg(short, long, conflicts_with = "redirect")]
        username: Option<String>,
        /// Provider that checks the password
        #[arg(short, long, default_value = "password")]
        provider: String,
        /// Sign in by exchanging this identity-provider redirect URL first
        #[arg(long)]
        redirect: Option<String>,
        /// Call the logout endpoint before exiting
        #[arg(long)]
        sign_out_on_exit: bool,
    },
}

fn watch_sign_in(username: Option<String>, provider: String, redirect: Option<String>) -> SignIn {
    match (username, redirect) {
        (Some(username), _) => SignIn::Password {
            provider,
            username: Some(username),
        },
        (None, Some(redirect)) => SignIn::Redirect(redirect),
        (None, None) => SignIn::Restore,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let log_path = if cli.log_to_file {
        paths.ensure_dirs()?;
        Some(paths.log_file())
    } else {
        None
    };
    init_logging("authsession", log_level, log_path);
    debug!(base_dir = %paths.base_dir().display(), api = %config.api_base_url, "Configuration loaded");

    match cli.command {
        Commands::Login { provider, username } => {
            commands::session::login(&config, &provider, username, &cli.format).await?;
        }
        Commands::Callback { url } => {
            commands::session::callback(&config, &url, &cli.format).await?;
        }
        Commands::Inspect { token } => {
            commands::inspect::inspect(&token, &cli.format)?;
        }
        Commands::Watch {
            username,
            provider,
            redirect,
            sign_out_on_exit,
        } => {
            let sign_in = watch_sign_in(username, provider, redirect);
            commands::session::watch(&config, sign_in, sign_out_on_exit, &cli.format).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_watch(args: &[&str]) -> SignIn {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Watch {
                username,
                provider,
                redirect,
                ..
            } => watch_sign_in(username, provider, redirect),
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_watch_without_flags_restores() {
        assert_eq!(parse_watch(&["authsession", "watch"]), SignIn::Restore);
    }

    #[test]
    fn test_watch_with_username_signs_in_first() {
        assert_eq!(
            parse_watch(&["authsession", "watch", "--username", "ada", "-p", "ldap"]),
            SignIn::Password {
                provider: "ldap".to_string(),
                username: Some("ada".to_string()),
            }
        );
    }

    #[test]
    fn test_watch_with_redirect_exchanges_it_first() {
        let redirect = "https://app.example.com/callback/github?code=abc";
        assert_eq!(
            parse_watch(&["authsession", "watch", "--redirect", redirect]),
            SignIn::Redirect(redirect.to_string())
        );
    }

    #[test]
    fn test_watch_rejects_username_with_redirect() {
        let result = Cli::try_parse_from([
            "authsession",
            "watch",
            "--username",
            "ada",
            "--redirect",
            "https://app.example.com/callback?code=abc",
        ]);
        assert!(result.is_err());
    }
}
