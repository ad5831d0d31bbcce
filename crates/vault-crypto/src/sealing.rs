//! # Anonymous Sealed Boxes
//!
//! Decryption shares leave a node sealed to the requesting client's X25519
//! key. The sender uses a fresh ephemeral key per message, so the client
//! cannot tell which oracle produced which share beyond its position.
//!
//! Compatible with libsodium `crypto_box_seal`.

use crate::{CryptoError, CryptoResult};
use crypto_box::{PublicKey, SecretKey};
use rand::rngs::OsRng;

/// Size of an X25519 public key in bytes.
pub const RECIPIENT_KEY_SIZE: usize = 32;

/// Seal `plaintext` so only the holder of `recipient_public_key` can open it.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyLength` if the key is not 32 bytes and
/// `CryptoError::SealFailed` if encryption fails.
pub fn seal_anonymous(recipient_public_key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let key: [u8; RECIPIENT_KEY_SIZE] =
        recipient_public_key
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: RECIPIENT_KEY_SIZE,
                actual: recipient_public_key.len(),
            })?;

    PublicKey::from(key)
        .seal(&mut OsRng, plaintext)
        .map_err(|e| CryptoError::SealFailed(e.to_string()))
}

/// Open a sealed box with the recipient's secret key.
pub fn unseal_anonymous(secret_key: &SecretKey, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    secret_key
        .unseal(sealed)
        .map_err(|e| CryptoError::UnsealFailed(e.to_string()))
}

/// Client-side X25519 key pair used to receive decryption shares.
pub struct RecipientKeyPair {
    secret: SecretKey,
}

impl RecipientKeyPair {
    /// Generate random key pair.
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::generate(&mut OsRng),
        }
    }

    /// Public key bytes.
    pub fn public_key_bytes(&self) -> [u8; RECIPIENT_KEY_SIZE] {
        *self.secret.public_key().as_bytes()
    }

    /// Hex-encoded public key, as placed in a get request.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Open a share sealed to this key pair.
    pub fn open(&self, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
        unseal_anonymous(&self.secret, sealed)
    }
}
