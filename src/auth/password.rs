//! Salted keyed hashing for admin passwords.
//!
//! Stored shape is `salt:digest`: a fresh random 16-byte salt rendered as
//! hex, and an HMAC-SHA256 of the password keyed by that salt. The per-record
//! salt defeats precomputed dictionary tables across accounts. The shape must
//! round-trip unchanged across process restarts, so it is part of the
//! persisted contract.

use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::{hex_decode, hex_encode};

type HmacSha256 = Hmac<Sha256>;

const SALT_BYTES: usize = 16;

/// Hash a plaintext password into the storable `salt:digest` form.
///
/// Empty passwords are accepted here; callers enforce any minimum length.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let salt = hex_encode(&salt);
    let digest = hex_encode(&keyed_digest(salt.as_bytes(), password));
    format!("{salt}:{digest}")
}

/// Confirm a plaintext password against a stored `salt:digest` value.
///
/// Malformed input (missing separator, empty salt or digest, non-hex digest)
/// yields `false`, never a panic. The digest comparison is constant-time.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected_hex)) = stored.split_once(':') else {
        return false;
    };
    if salt.is_empty() || expected_hex.is_empty() {
        return false;
    }
    let Some(expected) = hex_decode(expected_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(salt.as_bytes()) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn keyed_digest(key: &[u8], message: &str) -> Vec<u8> {
    // HMAC-SHA256 accepts keys of any length, so construction cannot fail.
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return Vec::new();
    };
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn round_trip() {
        let stored = hash_password("AssaiMart123#");
        assert!(verify_password("AssaiMart123#", &stored));
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("correct horse");
        assert!(!verify_password("battery staple", &stored));
    }

    #[test]
    fn salts_are_unique_per_call() {
        let first = hash_password("same-password");
        let second = hash_password("same-password");
        assert_ne!(first, second);
        // Both still verify despite differing salts.
        assert!(verify_password("same-password", &first));
        assert!(verify_password("same-password", &second));
    }

    #[test]
    fn stored_shape_is_salt_colon_digest() {
        let stored = hash_password("shape-check");
        let (salt, digest) = stored.split_once(':').expect("missing separator");
        assert_eq!(salt.len(), 32);
        assert_eq!(digest.len(), 64);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_password_round_trips() {
        let stored = hash_password("");
        assert!(verify_password("", &stored));
        assert!(!verify_password("not-empty", &stored));
    }

    #[test]
    fn malformed_stored_values_fail_quietly() {
        assert!(!verify_password("whatever", ""));
        assert!(!verify_password("whatever", "no-separator"));
        assert!(!verify_password("whatever", ":digest-without-salt"));
        assert!(!verify_password("whatever", "salt-without-digest:"));
        assert!(!verify_password("whatever", "aabb:not-hex-digest"));
    }

    #[test]
    fn stored_value_survives_round_trip_unchanged() {
        let stored = hash_password("persisted");
        let copied = stored.clone();
        assert!(verify_password("persisted", &copied));
    }
}
