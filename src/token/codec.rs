//! Token signing and verification.
//!
//! A token is three dot-separated URL-safe base64 fields:
//!
//! ```text
//! b64(identity) . b64(issued_at as i64 big-endian) . b64(HMAC-SHA256(key, first two fields))
//! ```
//!
//! The MAC covers the encoded identity and timestamp, so neither can be
//! changed without the key. Fields are only decoded after the MAC matches.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use tracing::trace;

use super::key::SigningKey;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

/// Why a token was not accepted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// Malformed, garbled, tampered or signed with another key
    #[error("invalid token")]
    Invalid,

    /// Signature is valid but the token is outside its allowed age
    #[error("token expired")]
    Expired,
}

/// An issued token in its wire form.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are bearer credentials; keep them out of debug logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

/// Issues and verifies tokens with a fixed key and maximum age.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: SigningKey,
    max_age: Duration,
}

impl TokenCodec {
    /// Create a codec. Tokens are accepted while `now - issued_at <= max_age`.
    pub fn new(key: SigningKey, max_age: Duration) -> Self {
        Self { key, max_age }
    }

    /// Maximum accepted token age.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Issue a token binding `identity` to `now`.
    ///
    /// Issuance time is recorded at whole-second precision.
    pub fn issue(&self, identity: &str, now: DateTime<Utc>) -> Token {
        let payload = URL_SAFE_NO_PAD.encode(identity.as_bytes());
        let issued_at = URL_SAFE_NO_PAD.encode(now.timestamp().to_be_bytes());
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&payload, &issued_at));

        Token(format!(
            "{payload}{SEPARATOR}{issued_at}{SEPARATOR}{signature}"
        ))
    }

    /// Verify a token and return the identity it was issued for.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, VerifyError> {
        let mut fields = token.split(SEPARATOR);
        let (payload, issued_at, signature) =
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(p), Some(t), Some(s), None) => (p, t, s),
                _ => {
                    trace!("Token does not have three fields");
                    return Err(VerifyError::Invalid);
                }
            };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| VerifyError::Invalid)?;

        // Constant-time comparison.
        self.mac_over(payload, issued_at)
            .verify_slice(&signature)
            .map_err(|_| {
                trace!("Token signature mismatch");
                VerifyError::Invalid
            })?;

        let issued_at: [u8; 8] = URL_SAFE_NO_PAD
            .decode(issued_at)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(VerifyError::Invalid)?;
        let issued_at = i64::from_be_bytes(issued_at);

        let identity = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(VerifyError::Invalid)?;

        // A negative age means the token claims to come from the future.
        let age = now.timestamp().saturating_sub(issued_at);
        if age < 0 || age > self.max_age.num_seconds() {
            trace!(age_secs = age, "Token outside its allowed age");
            return Err(VerifyError::Expired);
        }

        Ok(identity)
    }

    fn sign(&self, payload: &str, issued_at: &str) -> Vec<u8> {
        self.mac_over(payload, issued_at)
            .finalize()
            .into_bytes()
            .to_vec()
    }

    fn mac_over(&self, payload: &str, issued_at: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac.update(&[SEPARATOR as u8]);
        mac.update(issued_at.as_bytes());
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn codec(secret: &str, max_age_secs: i64) -> TokenCodec {
        TokenCodec::new(
            SigningKey::new(secret).unwrap(),
            Duration::seconds(max_age_secs),
        )
    }

    #[test]
    fn test_issue_then_verify_round_trips() {
        let codec = codec("your_secret_key", 3600);
        for identity in ["user1", "user2", "", "名前", "has.dots.inside", "a b/c+d="] {
            let token = codec.issue(identity, at(1_700_000_000));
            assert_eq!(
                codec.verify(token.as_str(), at(1_700_000_000)).as_deref(),
                Ok(identity)
            );
        }
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let codec = codec("key", 3600);
        let token = codec.issue("user1", at(1_000));

        assert_eq!(codec.verify(token.as_str(), at(4_599)).as_deref(), Ok("user1"));
        assert_eq!(codec.verify(token.as_str(), at(4_600)).as_deref(), Ok("user1"));
        assert_eq!(codec.verify(token.as_str(), at(4_601)), Err(VerifyError::Expired));
    }

    #[test]
    fn test_sub_second_issuance_is_truncated() {
        let codec = codec("key", 10);
        let issued = DateTime::from_timestamp(1_000, 900_000_000).unwrap();
        let token = codec.issue("user1", issued);

        assert!(codec.verify(token.as_str(), at(1_010)).is_ok());
        assert_eq!(codec.verify(token.as_str(), at(1_011)), Err(VerifyError::Expired));
    }

    #[test]
    fn test_future_dated_token_is_expired() {
        let codec = codec("key", 3600);
        let token = codec.issue("user1", at(2_000));
        assert_eq!(codec.verify(token.as_str(), at(1_999)), Err(VerifyError::Expired));
    }

    #[test]
    fn test_malformed_input_is_invalid() {
        let codec = codec("key", 3600);
        for garbage in [
            "",
            "not-a-token",
            "a.b",
            "a.b.c.d",
            "...",
            "!!!.@@@.###",
            "dXNlcjE.AAAAAAAAA-g.",
        ] {
            assert_eq!(codec.verify(garbage, at(1_000)), Err(VerifyError::Invalid), "{garbage}");
        }
    }

    #[test]
    fn test_tampering_any_byte_is_invalid() {
        let codec = codec("key", 3600);
        let token = codec.issue("user1", at(1_000)).into_string();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert_eq!(
                codec.verify(&tampered, at(1_000)),
                Err(VerifyError::Invalid),
                "byte {i} of {token}"
            );
        }
    }

    #[test]
    fn test_forged_timestamp_is_invalid() {
        let codec = codec("key", 3600);
        let token = codec.issue("user1", at(1_000)).into_string();
        let fields: Vec<&str> = token.split('.').collect();

        let fresh = URL_SAFE_NO_PAD.encode(100_000i64.to_be_bytes());
        let forged = format!("{}.{}.{}", fields[0], fresh, fields[2]);

        assert_eq!(codec.verify(&forged, at(100_000)), Err(VerifyError::Invalid));
    }

    #[test]
    fn test_other_key_is_invalid() {
        let issuer = codec("secret1", 3600);
        let verifier = codec("secret2", 3600);
        let token = issuer.issue("user1", at(1_000));

        assert_eq!(verifier.verify(token.as_str(), at(1_000)), Err(VerifyError::Invalid));
    }

    #[test]
    fn test_issue_is_deterministic_for_same_inputs() {
        let codec = codec("key", 3600);
        assert_eq!(codec.issue("user1", at(5)), codec.issue("user1", at(5)));
        assert_ne!(codec.issue("user1", at(5)), codec.issue("user1", at(6)));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let codec = codec("key", 3600);
        let token = codec.issue("user1", at(5));
        assert_eq!(format!("{:?}", token), "Token(..)");
    }
}
