//! Client-facing request and response messages.
//!
//! Field tags are part of the wire contract with clients and peers and must
//! never be renumbered. JSON field names follow the protobuf JSON mapping
//! (camelCase, default values omitted) so canonical JSON reports match what
//! any protobuf-aware client expects.

use serde::{Deserialize, Serialize};

/// Identity of a stored secret.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretIdentifier {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
}

// =============================================================================
// GET SECRETS
// =============================================================================

/// A single secret lookup, with the recipient keys decryption shares are sealed for.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretRequest {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SecretIdentifier>,
    /// Hex-encoded X25519 public keys.
    #[prost(string, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub encryption_keys: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetSecretsRequest {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<SecretRequest>,
}

/// Sealed decryption shares for one recipient key.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptedShares {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encryption_key: String,
    /// Hex-encoded sealed boxes, one per contributing oracle.
    #[prost(string, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shares: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretData {
    /// Hex-encoded threshold ciphertext as stored.
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encrypted_value: String,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub encrypted_decryption_key_shares: Vec<EncryptedShares>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretResponse {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SecretIdentifier>,
    #[prost(oneof = "secret_response::Result", tags = "2, 3")]
    #[serde(flatten)]
    pub result: Option<secret_response::Result>,
}

pub mod secret_response {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub enum Result {
        #[prost(message, tag = "2")]
        Data(super::SecretData),
        #[prost(string, tag = "3")]
        Error(String),
    }
}

impl SecretResponse {
    /// Response carrying an error for the given identifier.
    pub fn error(id: Option<SecretIdentifier>, message: impl Into<String>) -> Self {
        Self {
            id,
            result: Some(secret_response::Result::Error(message.into())),
        }
    }

    /// Secret data, if this response succeeded.
    pub fn data(&self) -> Option<&SecretData> {
        match &self.result {
            Some(secret_response::Result::Data(data)) => Some(data),
            _ => None,
        }
    }

    /// Mutable secret data, if this response succeeded.
    pub fn data_mut(&mut self) -> Option<&mut SecretData> {
        match &mut self.result {
            Some(secret_response::Result::Data(data)) => Some(data),
            _ => None,
        }
    }

    /// Error message, if this response failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            Some(secret_response::Result::Error(e)) => Some(e.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetSecretsResponse {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<SecretResponse>,
}

// =============================================================================
// CREATE / UPDATE SECRETS
// =============================================================================

/// A secret to write, encrypted under the committee's threshold public key.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptedSecret {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SecretIdentifier>,
    /// Hex-encoded threshold ciphertext.
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encrypted_value: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSecretsRequest {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub encrypted_secrets: Vec<EncryptedSecret>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSecretResponse {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SecretIdentifier>,
    #[prost(bool, tag = "2")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSecretsResponse {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<CreateSecretResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSecretsRequest {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub encrypted_secrets: Vec<EncryptedSecret>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSecretResponse {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SecretIdentifier>,
    #[prost(bool, tag = "2")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSecretsResponse {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<UpdateSecretResponse>,
}

// =============================================================================
// DELETE SECRETS
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteSecretsRequest {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<SecretIdentifier>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteSecretResponse {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SecretIdentifier>,
    #[prost(bool, tag = "2")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteSecretsResponse {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<DeleteSecretResponse>,
}

// =============================================================================
// LIST SECRET IDENTIFIERS
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListSecretIdentifiersRequest {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    /// Optional namespace filter.
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListSecretIdentifiersResponse {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<SecretIdentifier>,
    #[prost(bool, tag = "2")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

// =============================================================================
// STORED RECORDS
// =============================================================================

/// Value stored under a secret's key in the replicated store.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct StoredSecret {
    #[prost(bytes = "vec", tag = "1")]
    pub encrypted_secret: Vec<u8>,
}

/// Per-owner index of live identifiers.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct StoredMetadata {
    #[prost(message, repeated, tag = "1")]
    pub secret_identifiers: Vec<SecretIdentifier>,
}
