//! End-to-end exercise of the admin credential and session primitives as a
//! login handler would drive them, without a database.

use anyhow::Result;
use assaimart::auth::{hash_password, verify_password, TokenService, DEFAULT_TOKEN_TTL};
use secrecy::SecretString;
use std::time::Duration;

fn service(secret: &str) -> Result<TokenService> {
    Ok(TokenService::new(
        SecretString::from(secret.to_string()),
        DEFAULT_TOKEN_TTL,
    )?)
}

#[test]
fn credential_lifecycle() -> Result<()> {
    // Account creation stores a salted digest, never the plaintext.
    let stored = hash_password("AssaiMart123#");
    assert!(!stored.contains("AssaiMart123#"));

    // Login verifies the plaintext against the stored value.
    assert!(verify_password("AssaiMart123#", &stored));
    assert!(!verify_password("assaimart123#", &stored));

    // A password reset produces a fresh salt; old and new both verify
    // their own plaintexts only.
    let reset = hash_password("N3w-Password!");
    assert_ne!(stored, reset);
    assert!(verify_password("N3w-Password!", &reset));
    assert!(!verify_password("AssaiMart123#", &reset));
    Ok(())
}

#[test]
fn session_lifecycle() -> Result<()> {
    let tokens = service("deployment-secret")?;

    // Login issues a token bound to the admin identity.
    let admin_id = "0b0ab526-8aa3-4747-a063-b619bb70e6c2";
    let token = tokens.issue(admin_id)?;

    // Subsequent admin requests verify the same token.
    assert_eq!(tokens.verify(&token).as_deref(), Some(admin_id));

    // Logout is client-side only; the token keeps verifying until expiry.
    tokens.revoke(&token);
    assert_eq!(tokens.verify(&token).as_deref(), Some(admin_id));
    Ok(())
}

#[test]
fn tokens_do_not_cross_deployments() -> Result<()> {
    let staging = service("staging-secret")?;
    let production = service("production-secret")?;

    let token = staging.issue("admin")?;
    assert!(staging.verify(&token).is_some());
    assert!(production.verify(&token).is_none());
    Ok(())
}

#[test]
fn misconfigured_service_refuses_to_build() {
    assert!(TokenService::new(SecretString::default(), DEFAULT_TOKEN_TTL).is_err());
    assert!(TokenService::new(
        SecretString::from("secret".to_string()),
        Duration::from_secs(0)
    )
    .is_err());
}

#[test]
fn presented_garbage_is_rejected_uniformly() -> Result<()> {
    let tokens = service("deployment-secret")?;
    for junk in ["", "Bearer", "a.b.c", "AAAA", "not base64 at all"] {
        assert!(tokens.verify(junk).is_none(), "accepted: {junk}");
    }
    Ok(())
}
