//! Tagged request/response payloads over the five request kinds.
//!
//! The same oneofs are embedded in `Observation` and `Outcome`, and
//! `RequestPayload` is also what the pending-request store carries.

use crate::consensus::RequestType;
use crate::messages::*;

/// A client request of any kind.
#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum RequestPayload {
    #[prost(message, tag = "3")]
    GetSecrets(GetSecretsRequest),
    #[prost(message, tag = "4")]
    CreateSecrets(CreateSecretsRequest),
    #[prost(message, tag = "5")]
    UpdateSecrets(UpdateSecretsRequest),
    #[prost(message, tag = "6")]
    DeleteSecrets(DeleteSecretsRequest),
    #[prost(message, tag = "7")]
    ListSecretIdentifiers(ListSecretIdentifiersRequest),
}

/// A locally computed or aggregated response of any kind.
#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum ResponsePayload {
    #[prost(message, tag = "8")]
    GetSecrets(GetSecretsResponse),
    #[prost(message, tag = "9")]
    CreateSecrets(CreateSecretsResponse),
    #[prost(message, tag = "10")]
    UpdateSecrets(UpdateSecretsResponse),
    #[prost(message, tag = "11")]
    DeleteSecrets(DeleteSecretsResponse),
    #[prost(message, tag = "12")]
    ListSecretIdentifiers(ListSecretIdentifiersResponse),
}

impl RequestPayload {
    /// Request kind of this payload.
    pub fn request_type(&self) -> RequestType {
        match self {
            Self::GetSecrets(_) => RequestType::GetSecrets,
            Self::CreateSecrets(_) => RequestType::CreateSecrets,
            Self::UpdateSecrets(_) => RequestType::UpdateSecrets,
            Self::DeleteSecrets(_) => RequestType::DeleteSecrets,
            Self::ListSecretIdentifiers(_) => RequestType::ListSecretIdentifiers,
        }
    }
}

impl ResponsePayload {
    /// Request kind this response answers.
    pub fn request_type(&self) -> RequestType {
        match self {
            Self::GetSecrets(_) => RequestType::GetSecrets,
            Self::CreateSecrets(_) => RequestType::CreateSecrets,
            Self::UpdateSecrets(_) => RequestType::UpdateSecrets,
            Self::DeleteSecrets(_) => RequestType::DeleteSecrets,
            Self::ListSecretIdentifiers(_) => RequestType::ListSecretIdentifiers,
        }
    }
}
