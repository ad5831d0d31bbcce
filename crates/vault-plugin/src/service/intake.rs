//! Request intake: cheap structural checks before a request is queued.
//!
//! These checks reject obviously malformed requests early. They do not
//! replace the observation-time checks, which every oracle repeats.

use crate::adapters::RequestStore;
use crate::domain::{PluginError, PluginResult, VaultRequest};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info};
use vault_crypto::{CryptoResult, LazyPublicKey, ThresholdPublicKey};
use vault_types::{
    key_for, CreateSecretsRequest, DeleteSecretsRequest, EncryptedSecret, GetSecretsRequest,
    ListSecretIdentifiersRequest, RequestPayload, SecretIdentifier, UpdateSecretsRequest,
    VaultResponse, MAX_CLIENT_BATCH_SIZE,
};

fn reject(msg: impl Into<String>) -> PluginError {
    PluginError::InvalidRequest(msg.into())
}

fn has_full_id(id: &SecretIdentifier) -> bool {
    !id.key.is_empty() && !id.namespace.is_empty() && !id.owner.is_empty()
}

/// Shared create/update checks. The public key is optional: it is unknown
/// until the first plugin instance has loaded key material.
fn validate_write_request(
    public_key: Option<&dyn ThresholdPublicKey>,
    request_id: &str,
    items: &[EncryptedSecret],
) -> PluginResult<()> {
    if request_id.is_empty() {
        return Err(reject("request ID must not be empty"));
    }
    if items.len() >= MAX_CLIENT_BATCH_SIZE {
        return Err(reject(format!(
            "request batch size exceeds maximum of {MAX_CLIENT_BATCH_SIZE}"
        )));
    }
    if items.is_empty() {
        return Err(reject("request batch must contain at least 1 item"));
    }

    let mut seen = HashSet::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(id) = &item.id else {
            return Err(reject(format!("secret ID must not be nil at index {idx}")));
        };
        if !has_full_id(id) {
            return Err(reject(format!(
                "secret ID must have key, namespace and owner set at index {idx}:{id}"
            )));
        }
        if item.encrypted_value.is_empty() {
            return Err(reject(format!(
                "secret must have encrypted value set at index {idx}:{id}"
            )));
        }

        let ciphertext = hex::decode(&item.encrypted_value).map_err(|e| {
            reject(format!("failed to decode encrypted value at index {idx}:{e}"))
        })?;
        if let Some(pk) = public_key {
            pk.unmarshal_verify(&ciphertext).map_err(|e| {
                reject(format!("failed to verify encrypted value at index {idx}:{e}"))
            })?;
        }

        if !seen.insert(key_for(id)) {
            return Err(reject(format!("duplicate secret ID found at index {idx}: {id}")));
        }
    }
    Ok(())
}

pub fn validate_create_secrets_request(
    public_key: Option<&dyn ThresholdPublicKey>,
    req: &CreateSecretsRequest,
) -> PluginResult<()> {
    validate_write_request(public_key, &req.request_id, &req.encrypted_secrets)
}

pub fn validate_update_secrets_request(
    public_key: Option<&dyn ThresholdPublicKey>,
    req: &UpdateSecretsRequest,
) -> PluginResult<()> {
    validate_write_request(public_key, &req.request_id, &req.encrypted_secrets)
}

pub fn validate_delete_secrets_request(req: &DeleteSecretsRequest) -> PluginResult<()> {
    if req.request_id.is_empty() {
        return Err(reject("request ID must not be empty"));
    }
    if req.ids.len() >= MAX_CLIENT_BATCH_SIZE {
        return Err(reject(format!(
            "request batch size exceeds maximum of {MAX_CLIENT_BATCH_SIZE}"
        )));
    }

    let mut seen = HashSet::with_capacity(req.ids.len());
    for (idx, id) in req.ids.iter().enumerate() {
        if !has_full_id(id) {
            return Err(reject(format!(
                "secret ID must have key, namespace and owner set at index {idx}: {id}"
            )));
        }
        if !seen.insert(key_for(id)) {
            return Err(reject(format!("duplicate secret ID found at index {idx}: {id}")));
        }
    }
    Ok(())
}

pub fn validate_get_secrets_request(req: &GetSecretsRequest) -> PluginResult<()> {
    if req.requests.is_empty() {
        return Err(reject("no GetSecret request specified in request"));
    }
    if req.requests.len() >= MAX_CLIENT_BATCH_SIZE {
        return Err(reject(format!(
            "request batch size exceeds maximum of {MAX_CLIENT_BATCH_SIZE}"
        )));
    }

    for (idx, item) in req.requests.iter().enumerate() {
        let Some(id) = &item.id else {
            return Err(reject(format!("secret ID must have id set at index {idx}")));
        };
        if id.key.is_empty() {
            return Err(reject(format!(
                "secret ID must have key set at index {idx}: {id}"
            )));
        }
    }
    Ok(())
}

pub fn validate_list_secret_identifiers_request(
    req: &ListSecretIdentifiersRequest,
) -> PluginResult<()> {
    if req.request_id.is_empty() || req.owner.is_empty() || req.namespace.is_empty() {
        return Err(reject("requestID, owner or namespace must not be empty"));
    }
    Ok(())
}

/// Validate `payload` according to its kind.
pub fn validate_request(
    public_key: Option<&dyn ThresholdPublicKey>,
    payload: &RequestPayload,
) -> PluginResult<()> {
    match payload {
        RequestPayload::GetSecrets(req) => validate_get_secrets_request(req),
        RequestPayload::CreateSecrets(req) => validate_create_secrets_request(public_key, req),
        RequestPayload::UpdateSecrets(req) => validate_update_secrets_request(public_key, req),
        RequestPayload::DeleteSecrets(req) => validate_delete_secrets_request(req),
        RequestPayload::ListSecretIdentifiers(req) => validate_list_secret_identifiers_request(req),
    }
}

/// Entry point for locally submitted requests.
///
/// Validates, queues and hands back the channel the final response arrives on.
pub struct RequestIntake {
    store: Arc<RequestStore>,
    public_key: Arc<LazyPublicKey>,
}

impl RequestIntake {
    pub fn new(store: Arc<RequestStore>, public_key: Arc<LazyPublicKey>) -> Self {
        Self { store, public_key }
    }

    pub fn submit(&self, request: VaultRequest) -> PluginResult<oneshot::Receiver<VaultResponse>> {
        let public_key = self.public_key.get();
        if let Err(err) = validate_request(public_key.as_deref(), &request.payload) {
            info!(request_id = %request.id, error = %err, "request failed validation checks");
            return Err(err);
        }
        self.store.add(request)
    }

    /// Submit `request` and wait for its response.
    pub async fn execute(&self, request: VaultRequest) -> PluginResult<VaultResponse> {
        let id = request.id.clone();
        let rx = self.submit(request)?;
        debug!(request_id = %id, "sent request to reporting plugin");
        rx.await.map_err(|_| PluginError::ResponseDropped(id))
    }

    /// Hex-encoded committee public key.
    pub fn public_key_hex(&self) -> CryptoResult<String> {
        self.public_key.public_key_hex()
    }
}
