//! Key authority — mints one-time data keys and unwraps stored ones.
//!
//! Consumers depend on `Arc<dyn KeyAuthority>` and never see the master
//! key. [`LocalKeyAuthority`] is an in-process implementation; a managed
//! KMS client satisfying the same contract is substitutable.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DataKey, GeneratedDataKey, KEY_SIZE};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

/// Nonce size for the authority's internal key wrap (standard GCM nonce).
const WRAP_NONCE_SIZE: usize = 12;

/// Contract for a key-management authority.
///
/// `generate_data_key` returns both the plaintext key (used transiently by
/// the caller, never persisted) and its wrapped form (the only part that
/// may be stored). `unwrap_data_key` reverses the wrap.
pub trait KeyAuthority: Send + Sync {
    fn generate_data_key(&self) -> CryptoResult<GeneratedDataKey>;
    fn unwrap_data_key(&self, wrapped: &[u8]) -> CryptoResult<DataKey>;
}

/// In-process key authority backed by a single 256-bit master key.
///
/// Data keys are wrapped with AES-256-GCM under the master key; the wrap
/// blob layout is `nonce || ciphertext || tag` and is private to this
/// implementation.
pub struct LocalKeyAuthority {
    master: DataKey,
}

impl LocalKeyAuthority {
    /// Builds an authority around an existing master key.
    pub fn new(master_key: [u8; KEY_SIZE]) -> Self {
        Self {
            master: DataKey::from_bytes(master_key),
        }
    }

    /// Builds an authority with a freshly generated random master key.
    pub fn generate() -> Self {
        Self {
            master: DataKey::random(),
        }
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.master.as_bytes()))
    }

    fn wrap(&self, key_bytes: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; WRAP_NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), key_bytes)
            .map_err(|e| CryptoError::KeyGeneration(format!("key wrap failed: {e}")))?;

        let mut blob = Vec::with_capacity(WRAP_NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }
}

impl KeyAuthority for LocalKeyAuthority {
    fn generate_data_key(&self) -> CryptoResult<GeneratedDataKey> {
        let plaintext = DataKey::random();
        let wrapped = self.wrap(plaintext.as_bytes())?;
        Ok(GeneratedDataKey { plaintext, wrapped })
    }

    fn unwrap_data_key(&self, wrapped: &[u8]) -> CryptoResult<DataKey> {
        if wrapped.len() < WRAP_NONCE_SIZE {
            return Err(CryptoError::Decryption(
                "wrapped key blob too short".to_string(),
            ));
        }
        let (nonce_bytes, ciphertext) = wrapped.split_at(WRAP_NONCE_SIZE);

        let plaintext = Zeroizing::new(
            self.cipher()
                .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
                .map_err(|_| {
                    CryptoError::Decryption(
                        "wrapped key cannot be unwrapped (wrong master key or tampered blob)"
                            .to_string(),
                    )
                })?,
        );

        DataKey::from_slice(&plaintext)
    }
}
