//! Cookie value codec
//!
//! A session cookie value is built in three layers:
//!
//! 1. the session object serialized as JSON;
//! 2. either `base64(json)` or, when encryption is on,
//!    `base64(iv) + ":" + base64(aes_256_cbc(json))`;
//! 3. when signing is on, `body + "." + signature` (see [`KeyRing::sign`]).
//!
//! [`decode`] peels the layers in reverse order. Any failure on the way
//! (bad signature, bad base64, bad padding, bad JSON) yields `None`, so
//! attacker-controlled input can only ever result in an absent session.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::SessionError;
use crate::keyring::KeyRing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// The session payload: a JSON object
pub type SessionValue = Map<String, Value>;

/// Key length required by AES-256
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Length of the random initialization vector
pub const IV_LEN: usize = 16;

/// Conventional ceiling for a cookie value
pub const DEFAULT_MAX_COOKIE_BYTES: usize = 4093;

/// Signing and encryption settings for the codec
#[derive(Clone)]
pub struct CryptoOptions {
    signed: bool,
    encryption_key: Option<[u8; ENCRYPTION_KEY_LEN]>,
}

impl CryptoOptions {
    /// Validate and build crypto options.
    ///
    /// Fails if `encrypt` is set without a key, or with a key that is not
    /// exactly [`ENCRYPTION_KEY_LEN`] bytes.
    pub fn new(
        signed: bool,
        encrypt: bool,
        encryption_key: Option<&[u8]>,
    ) -> Result<Self, SessionError> {
        let encryption_key = if encrypt {
            let key = encryption_key.ok_or(SessionError::MissingEncryptionKey)?;
            let key = <[u8; ENCRYPTION_KEY_LEN]>::try_from(key).map_err(|_| {
                SessionError::InvalidEncryptionKeyLength {
                    expected: ENCRYPTION_KEY_LEN,
                    actual: key.len(),
                }
            })?;
            Some(key)
        } else {
            None
        };

        Ok(Self {
            signed,
            encryption_key,
        })
    }

    /// Signed, unencrypted cookies
    pub fn signed() -> Self {
        Self {
            signed: true,
            encryption_key: None,
        }
    }

    /// Whether cookies carry a signature
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Whether cookie bodies are encrypted
    pub fn is_encrypted(&self) -> bool {
        self.encryption_key.is_some()
    }
}

impl fmt::Debug for CryptoOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoOptions")
            .field("signed", &self.signed)
            .field("encrypt", &self.encryption_key.is_some())
            .finish()
    }
}

/// Encode a session object into a cookie value.
///
/// Returns [`SessionError::Overflow`] instead of a value longer than `max_bytes`.
pub fn encode(
    value: &SessionValue,
    keys: &KeyRing,
    crypto: &CryptoOptions,
    max_bytes: usize,
) -> Result<String, SessionError> {
    let json = serde_json::to_string(value)?;

    let body = match &crypto.encryption_key {
        Some(key) => encrypt(key, json.as_bytes()),
        None => STANDARD.encode(json),
    };

    let cookie = if crypto.signed {
        let signature = keys.sign(&body)?;
        format!("{}.{}", body, signature)
    } else {
        body
    };

    if cookie.len() > max_bytes {
        return Err(SessionError::Overflow {
            size: cookie.len(),
            limit: max_bytes,
        });
    }

    Ok(cookie)
}

/// Decode a cookie value back into a session object.
///
/// Returns `None` for anything that does not verify, decrypt and parse as a
/// JSON object.
pub fn decode(cookie: &str, keys: &KeyRing, crypto: &CryptoOptions) -> Option<SessionValue> {
    let body = if crypto.signed {
        let (body, signature) = cookie.rsplit_once('.')?;
        if !keys.verify(body, signature) {
            return None;
        }
        body
    } else {
        cookie
    };

    let json = match &crypto.encryption_key {
        Some(key) => {
            let (iv, ciphertext) = body.split_once(':')?;
            let iv = STANDARD.decode(iv).ok()?;
            let ciphertext = STANDARD.decode(ciphertext).ok()?;
            decrypt(key, &iv, &ciphertext)?
        }
        None => STANDARD.decode(body).ok()?,
    };

    serde_json::from_slice(&json).ok()
}

fn encrypt(key: &[u8; ENCRYPTION_KEY_LEN], plaintext: &[u8]) -> String {
    // Fresh IV per cookie, never reused under the same key
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(&iv));
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    format!("{}:{}", STANDARD.encode(iv), STANDARD.encode(ciphertext))
}

fn decrypt(key: &[u8; ENCRYPTION_KEY_LEN], iv: &[u8], ciphertext: &[u8]) -> Option<Vec<u8>> {
    Aes256CbcDec::new_from_slices(key, iv)
        .ok()?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .ok()
}
