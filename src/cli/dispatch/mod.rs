//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the server action with its full
//! configuration.

use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let jwt_secret = matches
        .get_one::<String>("jwt-secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --jwt-secret")?;

    let issuer = matches
        .get_one::<String>("issuer")
        .cloned()
        .unwrap_or_else(|| "SecurePass".to_string());

    let token_ttl_seconds = matches
        .get_one::<i64>("token-ttl")
        .copied()
        .unwrap_or(86_400);

    let frontend_url = matches
        .get_one::<String>("frontend-url")
        .cloned()
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret,
        issuer,
        token_ttl_seconds,
        frontend_url,
    }))
}
