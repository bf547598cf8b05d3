//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        admin_secret: auth_opts.admin_secret,
        token_ttl_hours: auth_opts.token_ttl_hours,
        seed_admin_email: auth_opts.seed_admin_email,
        seed_admin_password: auth_opts.seed_admin_password,
        frontend_origin: auth_opts.frontend_origin,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn maps_matches_to_server_action() -> Result<()> {
        let matches = crate::cli::commands::new().get_matches_from(vec![
            "assaimart",
            "--port",
            "9090",
            "--dsn",
            "postgres://user@localhost:5432/assaimart",
            "--admin-secret",
            "s3cret",
        ]);
        let Action::Server(args) = handler(&matches)?;
        assert_eq!(args.port, 9090);
        assert_eq!(args.dsn, "postgres://user@localhost:5432/assaimart");
        assert_eq!(args.token_ttl_hours, 24);
        Ok(())
    }
}
