//! # Vault Crypto - Cryptographic Contracts
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Observation content hashes |
//! | `sealing` | X25519 + XSalsa20-Poly1305 sealed box | Shipping decryption shares to a client |
//! | `threshold` | Threshold decryption contract | Ciphertext verification, partial decryption |
//!
//! The threshold scheme itself (share generation, combination) lives outside
//! this workspace. Nodes only consume it through the [`ThresholdPublicKey`],
//! [`PrivateKeyShare`] and [`KeyMaterialLoader`] traits.
//!
//! ## Security Properties
//!
//! - **Sealed box**: ephemeral sender key per message, only the recipient can open
//! - **Decryption shares**: zeroized after sealing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod sealing;
pub mod threshold;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use errors::{CryptoError, CryptoResult};
pub use hashing::{sha256, sha256_hex};
pub use sealing::{seal_anonymous, unseal_anonymous, RecipientKeyPair, RECIPIENT_KEY_SIZE};
pub use threshold::{
    Ciphertext, DecryptionShare, KeyMaterial, KeyMaterialLoader, LazyPublicKey, PrivateKeyShare,
    ThresholdPublicKey,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
