//! # Vault Types Crate
//!
//! Data model shared by every component of the vault committee.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every message exchanged between oracles
//!   (observations, outcomes, report metadata) and every record persisted in
//!   the replicated key-value store is defined here.
//! - **Deterministic Encoding**: protobuf encoding is used for anything that is
//!   hashed or compared across nodes. Reports that are only read by humans or
//!   clients use canonical JSON (sorted keys, no whitespace).
//! - **Tagged Payloads**: the five request kinds are modelled as sum types
//!   (`RequestPayload`, `ResponsePayload`) so every dispatch site is an
//!   exhaustive `match`.

pub mod consensus;
pub mod errors;
pub mod identifier;
pub mod json;
pub mod messages;
pub mod payload;
pub mod response;
pub mod signed;

pub use consensus::*;
pub use errors::{TypesError, TypesResult};
pub use identifier::{key_for, key_for_optional, DEFAULT_NAMESPACE, NIL_IDENTIFIER_KEY};
pub use json::to_canonical_json;
pub use messages::*;
pub use payload::{RequestPayload, ResponsePayload};
pub use response::VaultResponse;
pub use signed::{
    build_report_context, report_signing_digest, validate_signatures, SignedOcrResponse,
    SignerAddress, REPORT_CONTEXT_LEN,
};

/// Maximum number of sub-items a client may place in one request.
pub const MAX_CLIENT_BATCH_SIZE: usize = 10;
