//! Data key material.
//!
//! A [`DataKey`] is the one-time symmetric key that encrypts a single
//! payload. It lives on the stack of the call that uses it and is zeroized
//! when dropped.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key size in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// AEAD nonce size in bytes for payload encryption.
pub const NONCE_SIZE: usize = 16;

/// Authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit data encryption key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey([u8; KEY_SIZE]);

impl DataKey {
    /// Generates a fresh random key.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, checking the length.
    pub fn from_slice(slice: &[u8]) -> Result<Self, crate::CryptoError> {
        if slice.len() != KEY_SIZE {
            return Err(crate::CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

// Key material must never leak through Debug output or logs.
impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataKey(..)")
    }
}

/// A freshly generated data key: the plaintext form (transient) together
/// with its wrapped form (safe to persist).
pub struct GeneratedDataKey {
    /// Plaintext key bytes. Used once, then dropped and zeroized.
    pub plaintext: DataKey,
    /// The same key encrypted by the key authority's master key.
    pub wrapped: Vec<u8>,
}
