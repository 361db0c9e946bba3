//! Error types for the crypto layer.

use thiserror::Error;

/// All errors that can occur in envelope encryption operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key authority could not produce a fresh data key.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The key authority could not unwrap a stored data key, or an
    /// encrypted blob could not be interpreted at all.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Authentication tag verification failed: the ciphertext was
    /// tampered with or corrupted. Not retryable for this record.
    #[error("integrity check failed (tampered or corrupted ciphertext)")]
    Integrity,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid base64 encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
