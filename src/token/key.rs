//! Signing key material.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::fmt;

use crate::error::{GatekeeperError, Result};

/// Smallest key `generate_encoded` will produce, in bytes.
pub const MIN_KEY_BYTES: usize = 16;

/// Key used to sign and verify tokens.
///
/// Fixed for the lifetime of the process. The key bytes never appear in
/// `Debug` output.
#[derive(Clone)]
pub struct SigningKey {
    material: Vec<u8>,
}

impl SigningKey {
    /// Create a signing key from raw material. Empty material is rejected.
    pub fn new(material: impl Into<Vec<u8>>) -> Result<Self> {
        let material = material.into();
        if material.is_empty() {
            return Err(GatekeeperError::InvalidKey(
                "key material is empty".to_string(),
            ));
        }
        Ok(Self { material })
    }

    /// Generate `len` random bytes and render them as URL-safe base64,
    /// suitable for the `auth.secret_key` setting. `len` must be at least
    /// [`MIN_KEY_BYTES`].
    pub fn generate_encoded(len: usize) -> Result<String> {
        if len < MIN_KEY_BYTES {
            return Err(GatekeeperError::InvalidKey(format!(
                "generated keys need at least {} bytes, got {}",
                MIN_KEY_BYTES, len
            )));
        }
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.material
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.material.len())
            .finish_non_exhaustive()
    }
}
