//! Values exchanged with the OCR host.

use vault_types::RequestPayload;

/// Observation bytes tagged with the oracle that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributedObservation {
    pub observation: Vec<u8>,
    pub observer: u8,
}

/// Round metadata passed to outcome-producing phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutcomeContext {
    pub seq_nr: u64,
}

/// A report body plus the envelope the host signs alongside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportWithInfo {
    pub report: Vec<u8>,
    pub info: Vec<u8>,
}

/// Signature over a report, attributed to a committee member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributedOnchainSignature {
    pub signature: Vec<u8>,
    pub signer: u8,
}

/// A pending client request as seen by the plugin.
#[derive(Clone, PartialEq)]
pub struct VaultRequest {
    pub id: String,
    pub payload: RequestPayload,
}

impl VaultRequest {
    pub fn new(id: impl Into<String>, payload: RequestPayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

impl std::fmt::Debug for VaultRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultRequest")
            .field("id", &self.id)
            .field("type", &self.payload.request_type().as_str_name())
            .finish()
    }
}

/// Signature attached to a persisted DKG result package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributedSignature {
    pub signature: Vec<u8>,
    pub signer: u8,
}

/// DKG result package as persisted by the key generation protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultPackageValue {
    pub config_digest: [u8; 32],
    pub seq_nr: u64,
    pub report_with_result_package: Vec<u8>,
    pub signatures: Vec<AttributedSignature>,
}
