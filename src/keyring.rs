//! Ordered signing keys with rotation support
//!
//! The first key signs new cookies. Every key is tried when verifying, so a
//! key can be retired by moving it further down the list before removing it.
//! Signatures are `base64(hmac_sha256(message, key))` with the trailing `=`
//! padding stripped.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Ordered list of secret keys. Index 0 is the current signing key.
#[derive(Clone, Default)]
pub struct KeyRing {
    keys: Vec<Vec<u8>>,
}

impl KeyRing {
    /// Build a key ring from the given secrets, current key first
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Self {
            keys: keys.into_iter().map(|k| k.as_ref().to_vec()).collect(),
        }
    }

    /// Number of keys in the ring
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the ring holds no key at all
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sign a message with the current key.
    pub fn sign(&self, message: &str) -> Result<String, SessionError> {
        let key = self.keys.first().ok_or(SessionError::MissingKeys)?;
        let mac = keyed_mac(key, message);
        Ok(STANDARD_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    /// Check `signature` against every key, in order.
    ///
    /// A malformed signature is simply not valid; this never fails.
    pub fn verify(&self, message: &str, signature: &str) -> bool {
        let Ok(provided) = STANDARD_NO_PAD.decode(signature) else {
            return false;
        };

        // `verify_slice` compares in constant time
        self.keys
            .iter()
            .any(|key| keyed_mac(key, message).verify_slice(&provided).is_ok())
    }
}

fn keyed_mac(key: &[u8], message: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    mac
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .finish()
    }
}
