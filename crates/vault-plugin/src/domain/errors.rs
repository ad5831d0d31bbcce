//! Error types for the vault reporting plugin
//!
//! Three layers:
//! - [`ItemError`]: failure of one sub-item of one request. Never aborts a phase.
//! - [`StoreError`]: failure of the key-value store adapter.
//! - [`PluginError`]: phase-fatal conditions returned to the host.

use vault_crypto::CryptoError;
use vault_types::{RequestType, TypesError};

/// Outcome of processing a single sub-item.
///
/// `User` text is returned to the client verbatim. `Internal` detail is only
/// logged; the client sees the generic message for the request kind.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("{0}")]
    User(String),

    #[error("{0:#}")]
    Internal(anyhow::Error),
}

impl ItemError {
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Text placed in the response error field for a request of `kind`.
    pub fn client_message(&self, kind: RequestType) -> String {
        match self {
            Self::User(msg) => msg.clone(),
            Self::Internal(_) => generic_error_message(kind).to_string(),
        }
    }
}

impl From<anyhow::Error> for ItemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<StoreError> for ItemError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.into())
    }
}

/// Message shown to clients when a sub-item fails for an internal reason.
pub fn generic_error_message(kind: RequestType) -> &'static str {
    match kind {
        RequestType::GetSecrets => "failed to handle get secret request",
        RequestType::CreateSecrets => "failed to handle create secret request",
        RequestType::UpdateSecrets => "failed to handle update secret request",
        RequestType::DeleteSecrets => "failed to handle delete secret request",
        RequestType::ListSecretIdentifiers => "failed to handle list secret identifiers request",
        RequestType::Unspecified => "failed to handle request",
    }
}

/// Key-value store adapter errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key-value store error: {0}")]
    Backend(String),

    #[error("failed to decode stored record: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("no metadata found for owner {0}")]
    NoMetadata(String),

    #[error("id {key} not found in metadata for owner {owner}")]
    IdNotInMetadata { key: String, owner: String },

    #[error("invariant violation: metadata contains id but secret not found")]
    MissingSecretValue,

    #[error("metadata cannot be nil")]
    NilMetadata,
}

/// Phase-fatal plugin errors.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("could not unmarshal reporting plugin config: {0}")]
    ConfigDecode(prost::DecodeError),

    #[error("DKG instance ID cannot be nil")]
    MissingDkgInstanceId,

    #[error("could not get key material from DB: could not read result package from db: {0}")]
    ResultPackageRead(String),

    #[error("could not get key material from DB: no result package found in db for instance ID {0}")]
    ResultPackageNotFound(String),

    #[error("could not get key material from DB: {0}")]
    KeyMaterial(#[from] CryptoError),

    #[error("failed to unmarshal observations: {0}")]
    ObservationDecode(prost::DecodeError),

    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    #[error("could not unmarshal outcomes: {0}")]
    OutcomeDecode(prost::DecodeError),

    #[error("invalid report: {0}")]
    InvalidReport(String),

    #[error("could not build report: {0}")]
    ReportEncoding(#[from] TypesError),

    #[error("request with id {0} already exists")]
    DuplicateRequest(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("failed to transmit report: {0}")]
    Transmit(String),

    #[error("request {0} was dropped before a response arrived")]
    ResponseDropped(String),

    #[error("not implemented")]
    NotImplemented,
}

/// Result type for plugin phases.
pub type PluginResult<T> = Result<T, PluginError>;

/// Result type for the key-value store adapter.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for per-item processing.
pub type ItemResult<T> = Result<T, ItemError>;
