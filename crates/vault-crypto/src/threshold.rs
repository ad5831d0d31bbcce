//! # Threshold Decryption Contract
//!
//! Secrets are encrypted by clients under the committee's threshold public
//! key. A node can verify such a ciphertext and compute its own partial
//! decryption share; combining at least `t` shares into the plaintext happens
//! on the client.
//!
//! Key material is produced by distributed key generation and loaded from a
//! persisted result package through a [`KeyMaterialLoader`].

use crate::{CryptoError, CryptoResult};
use parking_lot::RwLock;
use std::sync::Arc;
use zeroize::Zeroizing;

/// A ciphertext that parsed and verified against the committee public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    /// Wrap bytes that a [`ThresholdPublicKey`] implementation has verified.
    pub fn from_verified_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw ciphertext bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// One node's marshalled partial decryption of a ciphertext.
///
/// Zeroized on drop.
pub struct DecryptionShare(Zeroizing<Vec<u8>>);

impl DecryptionShare {
    /// Wrap marshalled share bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Marshalled share.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Committee-wide threshold public key.
pub trait ThresholdPublicKey: Send + Sync {
    /// Parse `bytes` as a ciphertext and verify it was produced under this key.
    fn unmarshal_verify(&self, bytes: &[u8]) -> CryptoResult<Ciphertext>;

    /// Marshalled public key.
    fn marshal(&self) -> CryptoResult<Vec<u8>>;
}

/// This node's share of the threshold private key.
pub trait PrivateKeyShare: Send + Sync {
    /// Compute this node's partial decryption of `ciphertext`.
    fn decryption_share(&self, ciphertext: &Ciphertext) -> CryptoResult<DecryptionShare>;
}

/// Key material available to a running plugin instance.
#[derive(Clone)]
pub struct KeyMaterial {
    /// Committee public key
    pub public_key: Arc<dyn ThresholdPublicKey>,
    /// This node's private key share
    pub private_share: Arc<dyn PrivateKeyShare>,
}

/// Derives key material from a serialized DKG result package.
///
/// Implementations hold this node's DKG recipient key, which is needed to
/// decrypt the private share embedded in the package.
pub trait KeyMaterialLoader: Send + Sync {
    /// Unmarshal `result_package` and recover the public key and private share.
    fn load(&self, result_package: &[u8]) -> CryptoResult<KeyMaterial>;
}

/// Public key cell published by the plugin factory and read by request intake.
#[derive(Default)]
pub struct LazyPublicKey {
    inner: RwLock<Option<Arc<dyn ThresholdPublicKey>>>,
}

impl LazyPublicKey {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or replace) the current public key.
    pub fn set(&self, key: Arc<dyn ThresholdPublicKey>) {
        *self.inner.write() = Some(key);
    }

    /// Current public key, if one has been published.
    pub fn get(&self) -> Option<Arc<dyn ThresholdPublicKey>> {
        self.inner.read().clone()
    }

    /// Hex-encoded marshalled public key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::PublicKeyUnavailable` before the first `set`.
    pub fn public_key_hex(&self) -> CryptoResult<String> {
        let key = self.get().ok_or(CryptoError::PublicKeyUnavailable)?;
        Ok(hex::encode(key.marshal()?))
    }
}
