use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_ADMIN_SECRET: &str = "admin-secret";
pub const ARG_TOKEN_TTL_HOURS: &str = "token-ttl-hours";
pub const ARG_SEED_ADMIN_EMAIL: &str = "seed-admin-email";
pub const ARG_SEED_ADMIN_PASSWORD: &str = "seed-admin-password";
pub const ARG_FRONTEND_ORIGIN: &str = "frontend-origin";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_SECRET)
                .long(ARG_ADMIN_SECRET)
                .help("Signing secret for admin bearer tokens")
                .long_help(
                    "Signing secret for admin bearer tokens. Required: there is no \
                     built-in default, and changing it invalidates all outstanding tokens.",
                )
                .env("ASSAIMART_ADMIN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_HOURS)
                .long(ARG_TOKEN_TTL_HOURS)
                .help("Validity window for admin tokens, in hours")
                .env("ASSAIMART_TOKEN_TTL_HOURS")
                .default_value("24")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SEED_ADMIN_EMAIL)
                .long(ARG_SEED_ADMIN_EMAIL)
                .help("Email for the initial admin account, seeded when the table is empty")
                .env("ASSAIMART_SEED_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_SEED_ADMIN_PASSWORD)
                .long(ARG_SEED_ADMIN_PASSWORD)
                .help("Password for the initial admin account")
                .env("ASSAIMART_SEED_ADMIN_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_SEED_ADMIN_EMAIL),
        )
        .arg(
            Arg::new(ARG_FRONTEND_ORIGIN)
                .long(ARG_FRONTEND_ORIGIN)
                .help("Storefront origin allowed by CORS (any origin when unset)")
                .env("ASSAIMART_FRONTEND_ORIGIN"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub admin_secret: SecretString,
    pub token_ttl_hours: u64,
    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<SecretString>,
    pub frontend_origin: Option<String>,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if the required secret is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let admin_secret = matches
            .get_one::<String>(ARG_ADMIN_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --admin-secret")?;
        let token_ttl_hours = matches
            .get_one::<u64>(ARG_TOKEN_TTL_HOURS)
            .copied()
            .unwrap_or(24);
        let seed_admin_email = matches.get_one::<String>(ARG_SEED_ADMIN_EMAIL).cloned();
        let seed_admin_password = matches
            .get_one::<String>(ARG_SEED_ADMIN_PASSWORD)
            .cloned()
            .map(SecretString::from);
        let frontend_origin = matches.get_one::<String>(ARG_FRONTEND_ORIGIN).cloned();

        Ok(Self {
            admin_secret,
            token_ttl_hours,
            seed_admin_email,
            seed_admin_password,
            frontend_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn parse_defaults() -> Result<()> {
        temp_env::with_vars(
            [
                ("ASSAIMART_TOKEN_TTL_HOURS", None::<&str>),
                ("ASSAIMART_SEED_ADMIN_EMAIL", None::<&str>),
                ("ASSAIMART_SEED_ADMIN_PASSWORD", None::<&str>),
                ("ASSAIMART_FRONTEND_ORIGIN", None::<&str>),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec![
                    "assaimart",
                    "--dsn",
                    "postgres://localhost/assaimart",
                    "--admin-secret",
                    "s3cret",
                ]);
                let options = Options::parse(&matches)?;
                assert_eq!(options.admin_secret.expose_secret(), "s3cret");
                assert_eq!(options.token_ttl_hours, 24);
                assert_eq!(options.seed_admin_email, None);
                assert!(options.seed_admin_password.is_none());
                assert_eq!(options.frontend_origin, None);
                Ok(())
            },
        )
    }

    #[test]
    fn parse_seed_and_origin() -> Result<()> {
        let matches = crate::cli::commands::new().get_matches_from(vec![
            "assaimart",
            "--dsn",
            "postgres://localhost/assaimart",
            "--admin-secret",
            "s3cret",
            "--token-ttl-hours",
            "12",
            "--seed-admin-email",
            "assaimartofficial@gmail.com",
            "--seed-admin-password",
            "AssaiMart123#",
            "--frontend-origin",
            "https://assaimart.example",
        ]);
        let options = Options::parse(&matches)?;
        assert_eq!(options.token_ttl_hours, 12);
        assert_eq!(
            options.seed_admin_email.as_deref(),
            Some("assaimartofficial@gmail.com")
        );
        assert_eq!(
            options
                .seed_admin_password
                .as_ref()
                .map(ExposeSecret::expose_secret),
            Some("AssaiMart123#")
        );
        assert_eq!(
            options.frontend_origin.as_deref(),
            Some("https://assaimart.example")
        );
        Ok(())
    }

    #[test]
    fn ttl_of_zero_is_rejected() {
        let result = crate::cli::commands::new().try_get_matches_from(vec![
            "assaimart",
            "--dsn",
            "postgres://localhost/assaimart",
            "--admin-secret",
            "s3cret",
            "--token-ttl-hours",
            "0",
        ]);
        assert!(result.is_err());
    }
}
