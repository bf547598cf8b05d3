//! Stateless admin bearer tokens.
//!
//! A token binds an admin identity and issuance time: the payload
//! `"{admin_id}:{issued_at_ms}"` is signed with HMAC-SHA256 under a
//! server-wide secret, and the token is base64url (no padding) over
//! `"{payload}:{signature_hex}"`. Possession of a well-formed, correctly
//! signed, unexpired token is sufficient proof of identity; no token table
//! exists.
//!
//! A token transitions only by the passage of time (Issued -> Valid ->
//! Expired) or by the secret changing, which silently invalidates every
//! outstanding token at once. There is no Revoked state.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::{Duration, SystemTime};
use tracing::debug;

use super::{hex_decode, hex_encode};

type HmacSha256 = Hmac<Sha256>;

/// Validity window for issued tokens.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Why a token failed verification. Never crosses the API boundary: the
/// caller sees a uniform `None` so expired, forged, and malformed tokens
/// are indistinguishable to an attacker. Reasons go to debug logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerifyFailure {
    Missing,
    Encoding,
    Shape,
    Timestamp,
    Expired,
    Signature,
}

/// Mints and verifies admin bearer tokens.
pub struct TokenService {
    secret: SecretString,
    ttl_ms: i64,
}

impl TokenService {
    /// Build a token service with an explicit signing secret and TTL.
    ///
    /// The secret is injected at construction; there is no environment
    /// fallback. The secret must stay stable for the process lifetime for
    /// previously issued tokens to keep verifying.
    ///
    /// # Errors
    /// Returns an error if the secret is empty or the TTL is zero or out of
    /// range, so a misconfigured server refuses to start.
    pub fn new(secret: SecretString, ttl: Duration) -> Result<Self> {
        if secret.expose_secret().is_empty() {
            return Err(anyhow!("admin token secret must not be empty"));
        }
        let ttl_ms = i64::try_from(ttl.as_millis())
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| anyhow!("admin token ttl must be positive"))?;
        Ok(Self { secret, ttl_ms })
    }

    /// Issue a token for the given admin identity.
    ///
    /// # Errors
    /// Returns an error for an empty identifier or one containing `:`,
    /// which would corrupt the delimiter scheme.
    pub fn issue(&self, admin_id: &str) -> Result<String> {
        if admin_id.is_empty() || admin_id.contains(':') {
            return Err(anyhow!("admin id must be non-empty and must not contain ':'"));
        }
        Ok(self.issue_at(admin_id, now_unix_millis()))
    }

    /// Verify a token and return the admin identity it was issued for.
    ///
    /// All failure paths (absent/empty token, bad encoding, wrong field
    /// count, non-numeric timestamp, expiry, signature mismatch) return a
    /// uniform `None`.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<String> {
        match self.verify_at(token, now_unix_millis()) {
            Ok(admin_id) => Some(admin_id),
            Err(reason) => {
                debug!(?reason, "token verification failed");
                None
            }
        }
    }

    /// No-op. Tokens are stateless, so there is no server-side list to
    /// remove them from; a token stays valid until its TTL elapses. This is
    /// an accepted limitation of the scheme, kept explicit for the logout
    /// handler to call.
    pub fn revoke(&self, _token: &str) {}

    fn issue_at(&self, admin_id: &str, issued_at_ms: i64) -> String {
        let payload = format!("{admin_id}:{issued_at_ms}");
        let signature = self.sign(&payload);
        URL_SAFE_NO_PAD.encode(format!("{payload}:{signature}"))
    }

    fn verify_at(&self, token: &str, now_ms: i64) -> Result<String, VerifyFailure> {
        if token.is_empty() {
            return Err(VerifyFailure::Missing);
        }
        let decoded = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| VerifyFailure::Encoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| VerifyFailure::Encoding)?;

        let parts: Vec<&str> = decoded.split(':').collect();
        let [admin_id, issued_at, signature] = parts.as_slice() else {
            return Err(VerifyFailure::Shape);
        };

        let issued_at_ms: i64 = issued_at.parse().map_err(|_| VerifyFailure::Timestamp)?;
        if now_ms.saturating_sub(issued_at_ms) > self.ttl_ms {
            return Err(VerifyFailure::Expired);
        }

        // Sign the exact bytes that were presented, not a re-rendered
        // timestamp, so "007" and "7" cannot alias.
        let payload = &decoded[..admin_id.len() + 1 + issued_at.len()];
        let expected = hex_decode(signature).ok_or(VerifyFailure::Signature)?;
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()) else {
            return Err(VerifyFailure::Signature);
        };
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| VerifyFailure::Signature)?;

        Ok((*admin_id).to_string())
    }

    fn sign(&self, payload: &str) -> String {
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()) else {
            // HMAC-SHA256 accepts keys of any length; unreachable.
            return String::new();
        };
        mac.update(payload.as_bytes());
        hex_encode(&mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"***")
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

/// Milliseconds since the Unix epoch, for token issuance and expiry.
fn now_unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{now_unix_millis, TokenService, VerifyFailure, DEFAULT_TOKEN_TTL};
    use anyhow::Result;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use secrecy::SecretString;
    use std::time::Duration;

    fn service(secret: &str) -> Result<TokenService> {
        TokenService::new(SecretString::from(secret.to_string()), DEFAULT_TOKEN_TTL)
    }

    #[test]
    fn rejects_empty_secret() {
        let result = TokenService::new(SecretString::default(), DEFAULT_TOKEN_TTL);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_ttl() {
        let result = TokenService::new(
            SecretString::from("secret".to_string()),
            Duration::from_secs(0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn issue_then_verify_round_trip() -> Result<()> {
        let service = service("s3cret")?;
        let token = service.issue("admin-42")?;
        assert_eq!(service.verify(&token).as_deref(), Some("admin-42"));
        Ok(())
    }

    #[test]
    fn issue_rejects_delimiter_in_admin_id() -> Result<()> {
        let service = service("s3cret")?;
        assert!(service.issue("admin:42").is_err());
        assert!(service.issue("").is_err());
        Ok(())
    }

    #[test]
    fn expiry_boundary() -> Result<()> {
        let service = service("s3cret")?;
        let ttl_ms = i64::try_from(DEFAULT_TOKEN_TTL.as_millis()).unwrap_or(i64::MAX);
        let now = now_unix_millis();

        // 1ms past the window fails, and the internal cause is expiry.
        let stale = service.issue_at("admin-42", now - ttl_ms - 1);
        assert_eq!(service.verify_at(&stale, now), Err(VerifyFailure::Expired));

        // 1ms inside the window still verifies.
        let fresh = service.issue_at("admin-42", now - ttl_ms + 1);
        assert_eq!(
            service.verify_at(&fresh, now).as_deref(),
            Ok("admin-42")
        );
        Ok(())
    }

    #[test]
    fn tampered_signature_fails() -> Result<()> {
        let service = service("s3cret")?;
        let token = service.issue("admin-42")?;
        let decoded = URL_SAFE_NO_PAD.decode(token.as_bytes())?;

        // Flip one nibble of the hex signature at the tail of the payload.
        for index in (decoded.len() - 8)..decoded.len() {
            let mut forged = decoded.clone();
            forged[index] = if forged[index] == b'0' { b'1' } else { b'0' };
            let forged = URL_SAFE_NO_PAD.encode(forged);
            assert_eq!(service.verify(&forged), None);
        }
        Ok(())
    }

    #[test]
    fn tampered_admin_id_fails() -> Result<()> {
        let service = service("s3cret")?;
        let token = service.issue("admin-42")?;
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(token.as_bytes())?)?;
        let forged = URL_SAFE_NO_PAD.encode(decoded.replacen("admin-42", "admin-43", 1));
        assert_eq!(service.verify(&forged), None);
        Ok(())
    }

    #[test]
    fn malformed_inputs_yield_uniform_none() -> Result<()> {
        let service = service("s3cret")?;
        assert_eq!(service.verify(""), None);
        assert_eq!(service.verify("not-base64!!"), None);
        // Valid base64 but not UTF-8 colon-separated content.
        assert_eq!(service.verify(&URL_SAFE_NO_PAD.encode([0xff, 0xfe])), None);
        // Wrong part counts.
        assert_eq!(service.verify(&URL_SAFE_NO_PAD.encode("just-one")), None);
        assert_eq!(service.verify(&URL_SAFE_NO_PAD.encode("a:b:c:d")), None);
        // Non-numeric timestamp.
        assert_eq!(service.verify(&URL_SAFE_NO_PAD.encode("admin:soon:aabb")), None);
        Ok(())
    }

    #[test]
    fn internal_causes_are_distinguished() -> Result<()> {
        let service = service("s3cret")?;
        let now = now_unix_millis();
        assert_eq!(service.verify_at("", now), Err(VerifyFailure::Missing));
        assert_eq!(
            service.verify_at("not-base64!!", now),
            Err(VerifyFailure::Encoding)
        );
        assert_eq!(
            service.verify_at(&URL_SAFE_NO_PAD.encode("a:b"), now),
            Err(VerifyFailure::Shape)
        );
        assert_eq!(
            service.verify_at(&URL_SAFE_NO_PAD.encode("a:soon:cc"), now),
            Err(VerifyFailure::Timestamp)
        );
        let bad_sig = URL_SAFE_NO_PAD.encode(format!("a:{now}:aabbccdd"));
        assert_eq!(
            service.verify_at(&bad_sig, now),
            Err(VerifyFailure::Signature)
        );
        Ok(())
    }

    #[test]
    fn secret_rotation_invalidates_outstanding_tokens() -> Result<()> {
        let old = service("first-secret")?;
        let new = service("second-secret")?;
        let token = old.issue("admin-42")?;
        assert_eq!(old.verify(&token).as_deref(), Some("admin-42"));
        assert_eq!(new.verify(&token), None);
        assert_eq!(
            new.verify_at(&token, now_unix_millis()),
            Err(VerifyFailure::Signature)
        );
        Ok(())
    }

    #[test]
    fn revoke_is_a_no_op() -> Result<()> {
        let service = service("s3cret")?;
        let token = service.issue("admin-42")?;
        service.revoke(&token);
        // No server-side state to clear, the token still verifies until expiry.
        assert_eq!(service.verify(&token).as_deref(), Some("admin-42"));
        Ok(())
    }

    #[test]
    fn debug_redacts_secret() -> Result<()> {
        let service = service("top-secret")?;
        let rendered = format!("{service:?}");
        assert!(!rendered.contains("top-secret"));
        Ok(())
    }
}
