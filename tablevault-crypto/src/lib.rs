//! Envelope encryption layer for Tablevault.
//!
//! Provides per-payload envelope encryption using:
//! - A key authority that mints one-time data keys and wraps them under a
//!   master key
//! - AES-256-GCM for authenticated encryption with tamper detection
//! - Secure key handling with zeroization
//!
//! # Architecture
//!
//! The encryption uses a two-tier key system:
//!
//! 1. **Master key**: held by the key authority (a managed KMS or the
//!    in-process [`LocalKeyAuthority`]). It never leaves the authority.
//!
//! 2. **Data key**: a random key generated for each encrypt call. Only its
//!    wrapped (authority-encrypted) form is returned to the caller; the
//!    plaintext key is dropped and zeroized before `encrypt` returns.
//!
//! This bounds the blast radius of any single key compromise to one
//! ciphertext, and lets the authority rotate its master key without this
//! crate changing.
//!
//! This crate knows nothing about what the payloads are; callers decide
//! what to serialize into them.

mod authority;
mod envelope;
mod error;
mod key;

pub use authority::{KeyAuthority, LocalKeyAuthority};
pub use envelope::{Envelope, EnvelopeCrypto};
pub use error::{CryptoError, CryptoResult};
pub use key::{DataKey, GeneratedDataKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
