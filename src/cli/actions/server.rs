use crate::{
    api,
    api::seed::SeedConfig,
    auth::TokenService,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub admin_secret: SecretString,
    pub token_ttl_hours: u64,
    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<SecretString>,
    pub frontend_origin: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the token service is misconfigured or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let ttl = Duration::from_secs(args.token_ttl_hours.saturating_mul(60 * 60));
    // Fail fast on a missing or empty secret instead of falling back to a
    // guessable default.
    let token_service =
        TokenService::new(args.admin_secret, ttl).context("Invalid admin token configuration")?;

    let seed = SeedConfig {
        admin_email: args.seed_admin_email,
        admin_password: args.seed_admin_password,
    };

    api::new(
        args.port,
        args.dsn,
        token_service,
        seed,
        args.frontend_origin,
    )
    .await
}
