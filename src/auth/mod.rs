//! Admin authentication core: credential storage and bearer tokens.
//!
//! Two pieces, composed by the login and admin handlers:
//!
//! - [`password`]: turns a plaintext password into a storable `salt:digest`
//!   secret and later confirms a plaintext against it. The plaintext is
//!   never persisted, logged, or compared directly.
//! - [`token`]: mints and verifies stateless, time-limited, tamper-evident
//!   identity tokens signed with a server-wide secret.
//!
//! Because tokens carry no server-side state, logout cannot invalidate a
//! token before its natural expiry; rotating the signing secret invalidates
//! all outstanding tokens at once. This is an accepted trade-off of the
//! stateless scheme, not a defect.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{TokenService, DEFAULT_TOKEN_TTL};

use std::fmt::Write;

/// Lowercase hex rendering used for salts and HMAC digests.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

/// Strict inverse of [`hex_encode`]; `None` on odd length or non-hex input.
pub(crate) fn hex_decode(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(input.len() / 2);
    for pair in input.as_bytes().chunks_exact(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push((hi * 16 + lo) as u8);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::{hex_decode, hex_encode};

    #[test]
    fn hex_round_trip() {
        let bytes = [0x00, 0x7f, 0xff, 0x10, 0xab];
        let encoded = hex_encode(&bytes);
        assert_eq!(encoded, "007fff10ab");
        assert_eq!(hex_decode(&encoded), Some(bytes.to_vec()));
    }

    #[test]
    fn hex_decode_rejects_odd_length() {
        assert_eq!(hex_decode("abc"), None);
    }

    #[test]
    fn hex_decode_rejects_non_hex() {
        assert_eq!(hex_decode("zz"), None);
        assert_eq!(hex_decode("0g"), None);
    }

    #[test]
    fn hex_decode_empty_is_empty() {
        assert_eq!(hex_decode(""), Some(Vec::new()));
    }
}
