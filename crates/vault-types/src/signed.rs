//! Attested responses and their signature verification.
//!
//! A report is signed by committee members over
//! `keccak256(keccak256(report) || config_digest || epoch_round || extra_hash)`,
//! the OCR report-context digest used for EVM key bundles. Clients holding the
//! committee's signer addresses use [`validate_signatures`] before trusting a
//! payload.
//!
//! ## Report context layout (96 bytes)
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 0..32 | config digest |
//! | 32..59 | zero padding |
//! | 59..63 | sequence number (big-endian u32) |
//! | 63 | round (always 0) |
//! | 64..96 | extra hash (zero, unused) |

use crate::errors::{TypesError, TypesResult};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::HashSet;
use std::fmt;

/// Length of the full report context.
pub const REPORT_CONTEXT_LEN: usize = 96;

/// Minimum context length accepted by verification (digest + epoch/round).
pub const MIN_CONTEXT_LEN: usize = 64;

/// Length of a recoverable secp256k1 signature (r || s || v).
pub const SIGNATURE_LEN: usize = 65;

/// 20-byte Ethereum-style signer address.
pub type SignerAddress = [u8; 20];

/// Response shape handed to external clients.
///
/// If `error` is non-empty the committee could not serve the request and the
/// remaining fields are empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOcrResponse {
    pub error: String,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub context: Vec<u8>,
    #[serde(with = "hex_bytes_list")]
    pub signatures: Vec<Vec<u8>>,
}

impl fmt::Debug for SignedOcrResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignedOcrResponse {{ error: {}, payload: {}, context: <[{}]byte blob>, signatures: <[{}][]byte blob> }}",
            self.error,
            String::from_utf8_lossy(&self.payload),
            self.context.len(),
            self.signatures.len()
        )
    }
}

/// Build the 96-byte report context for a config digest and sequence number.
///
/// The layout is the OCR3 report timestamp: digest, 27 zero bytes, a 32-bit
/// big-endian epoch, a round byte, then a 32-byte extra hash. Only the low 32
/// bits of `seq_nr` fit in the epoch slot; verifiers read the same slot back.
pub fn build_report_context(config_digest: &[u8; 32], seq_nr: u64) -> Vec<u8> {
    let mut context = Vec::with_capacity(REPORT_CONTEXT_LEN);
    context.extend_from_slice(config_digest);
    context.extend_from_slice(&[0u8; 27]);
    let epoch = (seq_nr & u64::from(u32::MAX)) as u32;
    context.extend_from_slice(&epoch.to_be_bytes());
    context.push(0);
    context.extend_from_slice(&[0u8; 32]);
    context
}

/// Digest committee members sign for `payload` under `context`.
///
/// Only the first 64 bytes of `context` are used; the extra hash is always zero.
pub fn report_signing_digest(payload: &[u8], context: &[u8]) -> TypesResult<[u8; 32]> {
    if context.len() < MIN_CONTEXT_LEN {
        return Err(TypesError::ContextTooShort(context.len()));
    }

    let mut hasher = Keccak256::new();
    hasher.update(Keccak256::digest(payload));
    hasher.update(&context[..MIN_CONTEXT_LEN]);
    hasher.update([0u8; 32]);
    Ok(hasher.finalize().into())
}

/// Check that at least `min_required` distinct allowed signers signed `resp`.
pub fn validate_signatures(
    resp: &SignedOcrResponse,
    allowed_signers: &[SignerAddress],
    min_required: usize,
) -> TypesResult<()> {
    if resp.context.len() < MIN_CONTEXT_LEN {
        return Err(TypesError::ContextTooShort(resp.context.len()));
    }

    if resp.signatures.len() < min_required {
        return Err(TypesError::NotEnoughSignatures {
            expected: min_required,
            actual: resp.signatures.len(),
        });
    }

    let digest = report_signing_digest(&resp.payload, &resp.context)?;
    let allowed: HashSet<&SignerAddress> = allowed_signers.iter().collect();

    let mut valid_signers: HashSet<SignerAddress> = HashSet::new();
    for signature in &resp.signatures {
        let signer = recover_signer(&digest, signature)?;
        if allowed.contains(&signer) {
            valid_signers.insert(signer);
        }

        if valid_signers.len() >= min_required {
            return Ok(());
        }
    }

    Err(TypesError::InsufficientValidSigners {
        valid: valid_signers.len(),
        required: min_required,
    })
}

/// Recover the signer address of a 65-byte `r || s || v` signature over `digest`.
pub fn recover_signer(digest: &[u8; 32], signature: &[u8]) -> TypesResult<SignerAddress> {
    if signature.len() != SIGNATURE_LEN {
        return Err(TypesError::InvalidSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        )));
    }

    let v = signature[64];
    let recovery_id = match v {
        0 | 27 => RecoveryId::from_byte(0),
        1 | 28 => RecoveryId::from_byte(1),
        _ => None,
    }
    .ok_or_else(|| TypesError::InvalidSignature(format!("invalid recovery id {v}")))?;

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| TypesError::InvalidSignature(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|e| TypesError::InvalidSignature(e.to_string()))?;

    Ok(address_from_key(&key))
}

/// Ethereum address of a secp256k1 public key.
pub fn address_from_key(key: &VerifyingKey) -> SignerAddress {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point prefix.
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

mod hex_bytes_list {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&hex::encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let items = Vec::<String>::deserialize(deserializer)?;
        items
            .into_iter()
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
