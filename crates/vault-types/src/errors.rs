//! Error types for the vault data model.

use thiserror::Error;

/// Errors raised while encoding, decoding or verifying vault messages.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("failed to decode protobuf message: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("failed to encode protobuf message: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("failed to encode canonical JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid report envelope: {0}")]
    InvalidEnvelope(String),

    #[error("context too short: expected min 64 bytes, got {0} bytes")]
    ContextTooShort(usize),

    #[error("not enough signatures: expected min {expected}, got {actual}")]
    NotEnoughSignatures { expected: usize, actual: usize },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("only {valid} valid signatures, need at least {required}")]
    InsufficientValidSigners { valid: usize, required: usize },
}

/// Result alias for this crate.
pub type TypesResult<T> = Result<T, TypesError>;
