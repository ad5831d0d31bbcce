//! Messages exchanged between oracles during a reporting round.
//!
//! ```text
//! Observation (per node) ──gossip──→ StateTransition ──→ Outcomes
//!                                                          │
//!                                   ReportInfo envelope ←──┘ Reports
//! ```

use crate::errors::{TypesError, TypesResult};
use crate::payload::{RequestPayload, ResponsePayload};
use prost::Message;
use std::collections::BTreeMap;

/// Key bundle the host should sign reports with.
pub const KEY_BUNDLE_NAME: &str = "evm";

/// Envelope field carrying the key bundle name.
pub const ENVELOPE_KEY_BUNDLE_FIELD: &str = "keyBundleName";

/// Envelope field carrying the hex-encoded `ReportInfo`.
pub const ENVELOPE_REPORT_INFO_FIELD: &str = "reportInfo";

/// Request kind tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RequestType {
    Unspecified = 0,
    GetSecrets = 1,
    CreateSecrets = 2,
    UpdateSecrets = 3,
    DeleteSecrets = 4,
    ListSecretIdentifiers = 5,
}

impl RequestType {
    /// Stable upper-case name, as used in logs and protobuf JSON.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "REQUEST_TYPE_UNSPECIFIED",
            Self::GetSecrets => "GET_SECRETS",
            Self::CreateSecrets => "CREATE_SECRETS",
            Self::UpdateSecrets => "UPDATE_SECRETS",
            Self::DeleteSecrets => "DELETE_SECRETS",
            Self::ListSecretIdentifiers => "LIST_SECRET_IDENTIFIERS",
        }
    }
}

/// Serialization format of a report body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ReportFormat {
    Unspecified = 0,
    Json = 1,
    Protobuf = 2,
}

impl ReportFormat {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "REPORT_FORMAT_UNSPECIFIED",
            Self::Json => "REPORT_FORMAT_JSON",
            Self::Protobuf => "REPORT_FORMAT_PROTOBUF",
        }
    }
}

/// One node's view of one pending request.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Observation {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(enumeration = "RequestType", tag = "2")]
    pub request_type: i32,
    #[prost(oneof = "RequestPayload", tags = "3, 4, 5, 6, 7")]
    pub request: Option<RequestPayload>,
    #[prost(oneof = "ResponsePayload", tags = "8, 9, 10, 11, 12")]
    pub response: Option<ResponsePayload>,
}

/// All observations a node makes in one round.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Observations {
    #[prost(message, repeated, tag = "1")]
    pub observations: Vec<Observation>,
}

/// Quorum-agreed, canonicalized result for one request id.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Outcome {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(enumeration = "RequestType", tag = "2")]
    pub request_type: i32,
    #[prost(oneof = "RequestPayload", tags = "3, 4, 5, 6, 7")]
    pub request: Option<RequestPayload>,
    #[prost(oneof = "ResponsePayload", tags = "8, 9, 10, 11, 12")]
    pub response: Option<ResponsePayload>,
}

/// Outcomes of one round; the reports-plus-precursor blob.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Outcomes {
    #[prost(message, repeated, tag = "1")]
    pub outcomes: Vec<Outcome>,
}

/// Metadata identifying a report body.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ReportInfo {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(enumeration = "RequestType", tag = "2")]
    pub request_type: i32,
    #[prost(enumeration = "ReportFormat", tag = "3")]
    pub format: i32,
}

/// String-keyed struct wrapping `ReportInfo` together with the key bundle hint.
///
/// Mirrors the layout of `google.protobuf.Struct` restricted to string values;
/// `BTreeMap` keeps map entries in key order so the encoding is deterministic.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InfoStruct {
    #[prost(btree_map = "string, message", tag = "1")]
    pub fields: BTreeMap<String, InfoValue>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InfoValue {
    #[prost(oneof = "info_value::Kind", tags = "3")]
    pub kind: Option<info_value::Kind>,
}

pub mod info_value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(string, tag = "3")]
        StringValue(String),
    }
}

impl InfoValue {
    fn string(value: impl Into<String>) -> Self {
        Self {
            kind: Some(info_value::Kind::StringValue(value.into())),
        }
    }

    fn as_str(&self) -> Option<&str> {
        match &self.kind {
            Some(info_value::Kind::StringValue(s)) => Some(s.as_str()),
            None => None,
        }
    }
}

impl ReportInfo {
    pub fn new(id: impl Into<String>, request_type: RequestType, format: ReportFormat) -> Self {
        Self {
            id: id.into(),
            request_type: request_type.into(),
            format: format.into(),
        }
    }

    /// Wrap this report info in the signing envelope handed to the host.
    pub fn to_envelope(&self) -> Vec<u8> {
        let mut fields = BTreeMap::new();
        fields.insert(
            ENVELOPE_KEY_BUNDLE_FIELD.to_string(),
            InfoValue::string(KEY_BUNDLE_NAME),
        );
        fields.insert(
            ENVELOPE_REPORT_INFO_FIELD.to_string(),
            InfoValue::string(hex::encode(self.encode_to_vec())),
        );
        InfoStruct { fields }.encode_to_vec()
    }

    /// Extract report info from a signing envelope.
    pub fn from_envelope(envelope: &[u8]) -> TypesResult<Self> {
        let info = InfoStruct::decode(envelope)?;
        let raw = info
            .fields
            .get(ENVELOPE_REPORT_INFO_FIELD)
            .and_then(InfoValue::as_str)
            .ok_or_else(|| {
                TypesError::InvalidEnvelope(format!("missing {ENVELOPE_REPORT_INFO_FIELD} field"))
            })?;
        let bytes = hex::decode(raw)
            .map_err(|e| TypesError::InvalidEnvelope(format!("report info is not hex: {e}")))?;
        Ok(Self::decode(bytes.as_slice())?)
    }

    /// Key bundle named in an envelope, if any.
    pub fn key_bundle_name(envelope: &[u8]) -> TypesResult<Option<String>> {
        let info = InfoStruct::decode(envelope)?;
        Ok(info
            .fields
            .get(ENVELOPE_KEY_BUNDLE_FIELD)
            .and_then(InfoValue::as_str)
            .map(str::to_string))
    }
}

/// Offchain configuration of the reporting plugin.
///
/// Every numeric field uses 0 for "unset"; the plugin substitutes defaults.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ReportingPluginConfig {
    #[prost(uint32, tag = "1")]
    pub batch_size: u32,
    #[prost(uint32, tag = "2")]
    pub max_secrets_per_owner: u32,
    #[prost(uint32, tag = "3")]
    pub max_ciphertext_length_bytes: u32,
    #[prost(uint32, tag = "4")]
    pub max_identifier_key_length_bytes: u32,
    #[prost(uint32, tag = "5")]
    pub max_identifier_owner_length_bytes: u32,
    #[prost(uint32, tag = "6")]
    pub max_identifier_namespace_length_bytes: u32,
    #[prost(uint32, tag = "7")]
    pub limits_max_query_length: u32,
    #[prost(uint32, tag = "8")]
    pub limits_max_observation_length: u32,
    #[prost(uint32, tag = "9")]
    pub limits_max_reports_plus_precursor_length: u32,
    #[prost(uint32, tag = "10")]
    pub limits_max_report_length: u32,
    #[prost(uint32, tag = "11")]
    pub limits_max_report_count: u32,
    #[prost(uint32, tag = "12")]
    pub limits_max_key_value_modified_keys_plus_values_length: u32,
    #[prost(uint32, tag = "13")]
    pub limits_max_blob_payload_length: u32,
    #[prost(string, optional, tag = "14")]
    pub dkg_instance_id: Option<String>,
}
