//! # AssaiMart Storefront API
//!
//! Backend for the AssaiMart perfume storefront: a public product catalog,
//! checkout/order capture, newsletter and contact intake, and a token-based
//! admin back office for managing products, orders, messages, and
//! subscribers.
//!
//! ## Admin authentication
//!
//! Admin passwords are stored as salted keyed hashes (`salt:digest`) and
//! sessions are stateless HMAC-signed bearer tokens with a fixed validity
//! window (24h by default). The signing secret is mandatory configuration:
//! the server refuses to start without `ASSAIMART_ADMIN_SECRET`, and
//! rotating it invalidates every outstanding token at once.
//!
//! Because tokens are stateless there is no server-side revocation: logout
//! succeeds immediately for the client, but a captured token stays valid
//! until expiry. This trade-off is documented in the `auth` module rather
//! than patched with a side channel.
//!
//! ## Authorization
//!
//! Every `/api/admin/*` route (except login) passes through the same gate:
//! extract the `Bearer` token, verify it, then look up the live admin row.
//! All failures are a uniform `401 {"error":"Unauthorized"}` so the API
//! never reveals whether a token was expired, forged, or well-formed but
//! stale.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
