//! Session error types

use std::fmt;

/// Errors that can occur while configuring the middleware or committing a session.
///
/// Untrusted cookie input never produces one of these: a cookie that fails
/// verification, decryption or parsing is treated as an absent session.
#[derive(Debug)]
pub enum SessionError {
    /// Signing is enabled but no key was configured
    MissingKeys,
    /// Encryption is enabled but no encryption key was configured
    MissingEncryptionKey,
    /// The encryption key does not have the cipher's key length
    InvalidEncryptionKeyLength {
        /// Required key length in bytes
        expected: usize,
        /// Length of the configured key
        actual: usize,
    },
    /// Error during serialization
    SerializationError(String),
    /// The encoded cookie value exceeds the size ceiling
    Overflow {
        /// Length of the encoded cookie value
        size: usize,
        /// Configured ceiling
        limit: usize,
    },
    /// The session was replaced with something that is neither an object nor falsy
    InvalidReplacement(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::MissingKeys => write!(f, "Signed sessions require at least one key"),
            SessionError::MissingEncryptionKey => {
                write!(f, "Encrypted sessions require an encryption key")
            }
            SessionError::InvalidEncryptionKeyLength { expected, actual } => write!(
                f,
                "Encryption key must be {} bytes, got {} bytes",
                expected, actual
            ),
            SessionError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::Overflow { size, limit } => write!(
                f,
                "Session cookie is {} bytes, exceeding the {} byte limit",
                size, limit
            ),
            SessionError::InvalidReplacement(kind) => write!(
                f,
                "Session can only be replaced with an object or a falsy value, got {}",
                kind
            ),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerializationError(err.to_string())
    }
}
