//! Envelope encryption for stored payloads.
//!
//! Each payload is encrypted with a one-time data key obtained from the
//! key authority; only the wrapped form of that key is returned alongside
//! the ciphertext. Decryption asks the authority to unwrap the key, then
//! verifies the authentication tag before releasing plaintext.

use crate::authority::KeyAuthority;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{NONCE_SIZE, TAG_SIZE};
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Key, Nonce, Tag};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// AES-256-GCM with a 16-byte nonce and detached 16-byte tag.
type PayloadCipher = AesGcm<Aes256, U16>;

/// An envelope-encrypted payload. All four fields are base64-encoded and
/// travel together; a record either carries the full envelope or none of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// AES-256-GCM ciphertext (tag detached).
    pub ciphertext: String,
    /// 16-byte nonce.
    pub nonce: String,
    /// 16-byte GCM authentication tag.
    pub auth_tag: String,
    /// The data key, encrypted by the key authority.
    pub wrapped_key: String,
}

/// Envelope encryption service.
///
/// Holds no mutable state beyond the shared authority handle, so it is
/// freely callable from concurrent requests. The plaintext data key for
/// each operation is local to that call and zeroized on drop.
#[derive(Clone)]
pub struct EnvelopeCrypto {
    authority: Arc<dyn KeyAuthority>,
}

impl EnvelopeCrypto {
    pub fn new(authority: Arc<dyn KeyAuthority>) -> Self {
        Self { authority }
    }

    /// Encrypts a payload under a fresh data key.
    ///
    /// Fails with [`CryptoError::KeyGeneration`] when the authority cannot
    /// produce a key; nothing is persisted by this layer either way.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<Envelope> {
        let generated = self.authority.generate_data_key()?;
        let cipher =
            PayloadCipher::new(Key::<PayloadCipher>::from_slice(generated.plaintext.as_bytes()));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce_bytes), b"", &mut buffer)
            .map_err(|e| CryptoError::Encryption(format!("payload encryption failed: {e}")))?;

        Ok(Envelope {
            ciphertext: BASE64.encode(&buffer),
            nonce: BASE64.encode(nonce_bytes),
            auth_tag: BASE64.encode(tag),
            wrapped_key: BASE64.encode(&generated.wrapped),
        })
        // `generated.plaintext` drops here; the key bytes are zeroized.
    }

    /// Decrypts an envelope back to its plaintext payload.
    ///
    /// Fails with [`CryptoError::Decryption`] when the authority cannot
    /// unwrap the key and [`CryptoError::Integrity`] when tag verification
    /// fails. Both are non-retryable for the record.
    pub fn decrypt(&self, envelope: &Envelope) -> CryptoResult<String> {
        let wrapped = decode_field("wrapped_key", &envelope.wrapped_key)?;
        let nonce_bytes = decode_field("nonce", &envelope.nonce)?;
        let tag_bytes = decode_field("auth_tag", &envelope.auth_tag)?;
        let mut buffer = decode_field("ciphertext", &envelope.ciphertext)?;

        if nonce_bytes.len() != NONCE_SIZE {
            return Err(CryptoError::Decryption(format!(
                "nonce must be {NONCE_SIZE} bytes, got {}",
                nonce_bytes.len()
            )));
        }
        if tag_bytes.len() != TAG_SIZE {
            return Err(CryptoError::Decryption(format!(
                "auth tag must be {TAG_SIZE} bytes, got {}",
                tag_bytes.len()
            )));
        }

        let key = self.authority.unwrap_data_key(&wrapped)?;
        let cipher = PayloadCipher::new(Key::<PayloadCipher>::from_slice(key.as_bytes()));

        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&nonce_bytes),
                b"",
                &mut buffer,
                Tag::from_slice(&tag_bytes),
            )
            .map_err(|_| CryptoError::Integrity)?;

        String::from_utf8(buffer)
            .map_err(|e| CryptoError::Decryption(format!("plaintext is not valid UTF-8: {e}")))
    }
}

fn decode_field(field: &str, value: &str) -> CryptoResult<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| CryptoError::InvalidEncoding(format!("{field}: {e}")))
}
