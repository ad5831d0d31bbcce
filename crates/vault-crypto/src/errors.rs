//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key length
    #[error("invalid public key size: expected {expected} bytes, got {actual} bytes")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Sealing a message for a recipient failed
    #[error("failed to seal message: {0}")]
    SealFailed(String),

    /// Opening a sealed message failed
    #[error("failed to open sealed message: {0}")]
    UnsealFailed(String),

    /// Ciphertext could not be parsed or was not produced under the committee key
    #[error("{0}")]
    CiphertextVerification(String),

    /// Partial decryption failed
    #[error("could not generate decryption share: {0}")]
    DecryptionShare(String),

    /// Public key could not be marshalled
    #[error("could not marshal public key: {0}")]
    PublicKeyMarshal(String),

    /// Public key has not been published yet
    #[error("could not get public key: is the plugin initialized?")]
    PublicKeyUnavailable,

    /// Key material could not be derived from a DKG result package
    #[error("could not load key material: {0}")]
    KeyMaterial(String),
}

/// Result alias for this crate.
pub type CryptoResult<T> = Result<T, CryptoError>;
