//! Deterministic stand-in for a threshold scheme.
//!
//! Provides no confidentiality: ciphertexts carry the plaintext after a small
//! header. It exists so dependent crates can exercise ciphertext verification,
//! share generation and key loading without a DKG.

use crate::hashing::sha256;
use crate::threshold::{
    Ciphertext, DecryptionShare, KeyMaterial, KeyMaterialLoader, PrivateKeyShare,
    ThresholdPublicKey,
};
use crate::{CryptoError, CryptoResult};
use std::collections::BTreeSet;
use std::sync::Arc;

const CIPHERTEXT_MAGIC: &[u8; 4] = b"TDH2";
const HEADER_LEN: usize = 12;

/// A committee of `n` nodes sharing one test key.
#[derive(Clone, Debug)]
pub struct TestScheme {
    key_id: u64,
    n: u8,
}

impl TestScheme {
    /// New scheme for `n` nodes identified by `key_id`.
    pub fn new(key_id: u64, n: u8) -> Self {
        Self { key_id, n }
    }

    /// Encrypt `plaintext` under this scheme's public key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + plaintext.len());
        out.extend_from_slice(CIPHERTEXT_MAGIC);
        out.extend_from_slice(&self.key_id.to_be_bytes());
        out.extend_from_slice(plaintext);
        out
    }

    /// Public key handle.
    pub fn public_key(&self) -> Arc<dyn ThresholdPublicKey> {
        Arc::new(TestPublicKey {
            key_id: self.key_id,
        })
    }

    /// Key material for node `index`.
    pub fn key_material(&self, index: u8) -> KeyMaterial {
        KeyMaterial {
            public_key: self.public_key(),
            private_share: Arc::new(TestPrivateShare { index }),
        }
    }

    /// Serialized result package understood by [`TestKeyLoader`].
    pub fn result_package(&self) -> Vec<u8> {
        let mut out = self.key_id.to_be_bytes().to_vec();
        out.push(self.n);
        out
    }

    /// Recover the plaintext once `threshold` distinct nodes contributed shares.
    pub fn combine(
        &self,
        ciphertext: &[u8],
        shares: &[Vec<u8>],
        threshold: usize,
    ) -> CryptoResult<Vec<u8>> {
        let ct = self.public_key().unmarshal_verify(ciphertext)?;
        let mut contributors = BTreeSet::new();
        for share in shares {
            let (index, digest) = share
                .split_first()
                .ok_or_else(|| CryptoError::DecryptionShare("empty share".to_string()))?;
            if digest == share_digest(*index, &ct).as_slice() {
                contributors.insert(*index);
            }
        }
        if contributors.len() < threshold {
            return Err(CryptoError::DecryptionShare(format!(
                "need {threshold} shares, got {}",
                contributors.len()
            )));
        }
        Ok(ct.as_bytes()[HEADER_LEN..].to_vec())
    }
}

struct TestPublicKey {
    key_id: u64,
}

impl ThresholdPublicKey for TestPublicKey {
    fn unmarshal_verify(&self, bytes: &[u8]) -> CryptoResult<Ciphertext> {
        if bytes.len() < HEADER_LEN || &bytes[..4] != CIPHERTEXT_MAGIC {
            return Err(CryptoError::CiphertextVerification(
                "malformed ciphertext".to_string(),
            ));
        }
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[4..HEADER_LEN]);
        if u64::from_be_bytes(id) != self.key_id {
            return Err(CryptoError::CiphertextVerification(
                "ciphertext was not encrypted under the committee public key".to_string(),
            ));
        }
        Ok(Ciphertext::from_verified_bytes(bytes.to_vec()))
    }

    fn marshal(&self) -> CryptoResult<Vec<u8>> {
        let mut out = b"TPK".to_vec();
        out.extend_from_slice(&self.key_id.to_be_bytes());
        Ok(out)
    }
}

struct TestPrivateShare {
    index: u8,
}

impl PrivateKeyShare for TestPrivateShare {
    fn decryption_share(&self, ciphertext: &Ciphertext) -> CryptoResult<DecryptionShare> {
        let mut out = vec![self.index];
        out.extend_from_slice(&share_digest(self.index, ciphertext));
        Ok(DecryptionShare::new(out))
    }
}

fn share_digest(index: u8, ciphertext: &Ciphertext) -> [u8; 32] {
    let mut data = vec![index];
    data.extend_from_slice(ciphertext.as_bytes());
    sha256(&data)
}

/// Loader for packages produced by [`TestScheme::result_package`].
pub struct TestKeyLoader {
    index: u8,
}

impl TestKeyLoader {
    /// Loader for node `index`.
    pub fn new(index: u8) -> Self {
        Self { index }
    }
}

impl KeyMaterialLoader for TestKeyLoader {
    fn load(&self, result_package: &[u8]) -> CryptoResult<KeyMaterial> {
        if result_package.len() != 9 {
            return Err(CryptoError::KeyMaterial(format!(
                "result package has {} bytes, expected 9",
                result_package.len()
            )));
        }
        let mut id = [0u8; 8];
        id.copy_from_slice(&result_package[..8]);
        let n = result_package[8];
        if self.index >= n {
            return Err(CryptoError::KeyMaterial(format!(
                "node index {} outside committee of {n}",
                self.index
            )));
        }
        Ok(TestScheme::new(u64::from_be_bytes(id), n).key_material(self.index))
    }
}
