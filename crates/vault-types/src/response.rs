//! Result delivered back to the caller waiting on a request.

use crate::signed::SignedOcrResponse;
use std::fmt;

/// Final answer for one request id.
///
/// Either carries an `error` (timeout, routing failure) or an attested report:
/// the report body, its format name, the 96-byte OCR report context and the
/// signatures collected by the host.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct VaultResponse {
    pub id: String,
    pub error: String,
    pub payload: Vec<u8>,
    pub format: String,
    pub context: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
}

impl VaultResponse {
    /// Response reporting that a request expired before a report was produced.
    pub fn timeout(id: &str) -> Self {
        Self {
            id: id.to_string(),
            error: format!("timeout exceeded: could not process request {id} before expiry"),
            ..Default::default()
        }
    }

    pub fn request_id(&self) -> &str {
        &self.id
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Convert into the externally verifiable response shape.
    pub fn to_signed_response(&self) -> SignedOcrResponse {
        SignedOcrResponse {
            error: self.error.clone(),
            payload: self.payload.clone(),
            context: self.context.clone(),
            signatures: self.signatures.clone(),
        }
    }
}

impl fmt::Debug for VaultResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultResponse")
            .field("id", &self.id)
            .field("error", &self.error)
            .field("payload_len", &self.payload.len())
            .field("format", &self.format)
            .field("context_len", &self.context.len())
            .field("signatures", &self.signatures.len())
            .finish()
    }
}
