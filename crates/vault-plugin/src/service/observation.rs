//! Observation phase: answer each pending request against the local store.
//!
//! Sub-items are processed independently; a failing item becomes an error
//! entry in the response and never aborts its siblings. Existence and quota
//! checks for writes are left to state transition.

use super::VaultReportingPlugin;
use crate::adapters::VaultStore;
use crate::domain::{validate_identifier, ItemError, ItemResult, PluginResult, RoundContext};
use crate::metrics;
use crate::ports::KeyValueReader;
use anyhow::Context;
use prost::Message;
use std::collections::HashMap;
use tracing::{debug, error};
use vault_crypto::{seal_anonymous, RECIPIENT_KEY_SIZE};
use vault_types::{
    key_for, key_for_optional, secret_response, CreateSecretResponse, CreateSecretsRequest,
    CreateSecretsResponse, DeleteSecretResponse, DeleteSecretsRequest, DeleteSecretsResponse,
    EncryptedSecret, EncryptedShares, GetSecretsRequest, GetSecretsResponse,
    ListSecretIdentifiersRequest, ListSecretIdentifiersResponse, Observation, Observations,
    RequestPayload, RequestType, ResponsePayload, SecretData, SecretIdentifier, SecretRequest,
    SecretResponse, UpdateSecretResponse, UpdateSecretsRequest, UpdateSecretsResponse,
};

type ReadStore<'a> = VaultStore<'a, dyn KeyValueReader + 'a>;

/// Occurrences of each raw identifier key within one request.
fn count_keys<'a>(ids: impl Iterator<Item = Option<&'a SecretIdentifier>>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for id in ids {
        *counts.entry(key_for_optional(id)).or_insert(0) += 1;
    }
    counts
}

fn log_item_error(kind: RequestType, request_id: &str, item: &str, err: &ItemError) {
    metrics::record_item_error(kind.as_str_name(), err.is_user());
    error!(
        request_id = %request_id,
        request_type = kind.as_str_name(),
        item = %item,
        error = %err,
        "failed to observe request item"
    );
}

impl VaultReportingPlugin {
    pub(crate) fn build_observations(
        &self,
        ctx: &RoundContext,
        seq_nr: u64,
        kv: &dyn KeyValueReader,
    ) -> PluginResult<Vec<u8>> {
        let batch = self.queue.first_n(self.config.batch_size)?;
        if !batch.is_empty() {
            debug!(seq_nr, batch_size = self.config.batch_size, "observation started");
        }

        let store: ReadStore<'_> = VaultStore::new(kv);
        let mut observations = Vec::with_capacity(batch.len());
        for request in batch {
            ctx.check()?;

            let response = match &request.payload {
                RequestPayload::GetSecrets(req) => {
                    ResponsePayload::GetSecrets(self.observe_get_secrets(ctx, &store, &request.id, req)?)
                }
                RequestPayload::CreateSecrets(req) => {
                    ResponsePayload::CreateSecrets(self.observe_create_secrets(req))
                }
                RequestPayload::UpdateSecrets(req) => {
                    ResponsePayload::UpdateSecrets(self.observe_update_secrets(req))
                }
                RequestPayload::DeleteSecrets(req) => {
                    ResponsePayload::DeleteSecrets(self.observe_delete_secrets(&store, req))
                }
                RequestPayload::ListSecretIdentifiers(req) => ResponsePayload::ListSecretIdentifiers(
                    self.observe_list_secret_identifiers(&store, req),
                ),
            };

            observations.push(Observation {
                id: request.id,
                request_type: request.payload.request_type().into(),
                request: Some(request.payload),
                response: Some(response),
            });
        }

        if !observations.is_empty() {
            let ids: Vec<&str> = observations.iter().map(|o| o.id.as_str()).collect();
            debug!(?ids, count = observations.len(), "observation complete");
            metrics::record_observations_built(observations.len());
        }

        Ok(Observations { observations }.encode_to_vec())
    }

    // =========================================================================
    // GetSecrets
    // =========================================================================

    fn observe_get_secrets(
        &self,
        ctx: &RoundContext,
        store: &ReadStore<'_>,
        request_id: &str,
        req: &GetSecretsRequest,
    ) -> PluginResult<GetSecretsResponse> {
        let mut responses = Vec::with_capacity(req.requests.len());
        for item in &req.requests {
            // Share generation is the expensive step.
            ctx.check()?;
            match self.observe_get_secret(store, item) {
                Ok(resp) => {
                    debug!(request_id = %request_id, item = %key_for_optional(resp.id.as_ref()), "observed get secret request item");
                    responses.push(resp);
                }
                Err(err) => {
                    log_item_error(
                        RequestType::GetSecrets,
                        request_id,
                        &key_for_optional(item.id.as_ref()),
                        &err,
                    );
                    responses.push(SecretResponse::error(
                        item.id.clone(),
                        err.client_message(RequestType::GetSecrets),
                    ));
                }
            }
        }
        Ok(GetSecretsResponse { responses })
    }

    fn observe_get_secret(
        &self,
        store: &ReadStore<'_>,
        item: &SecretRequest,
    ) -> ItemResult<SecretResponse> {
        let id = validate_identifier(item.id.as_ref(), &self.config.identifier_limits)?;

        let secret = store
            .get_secret(&id)
            .context("failed to read secret from key-value store")?
            .ok_or_else(|| ItemError::user("key does not exist"))?;

        let ciphertext = self
            .key_material
            .public_key
            .unmarshal_verify(&secret.encrypted_secret)
            .context("failed to unmarshal ciphertext")?;

        let share = self
            .key_material
            .private_share
            .decryption_share(&ciphertext)
            .context("could not generate decryption share")?;

        let mut shares = Vec::with_capacity(item.encryption_keys.len());
        for encryption_key in &item.encryption_keys {
            let public_key = hex::decode(encryption_key).map_err(|e| {
                ItemError::user(format!("failed to convert public key to bytes: {e}"))
            })?;

            if public_key.len() != RECIPIENT_KEY_SIZE {
                return Err(ItemError::user(format!(
                    "invalid public key size: expected {RECIPIENT_KEY_SIZE} bytes, got {} bytes",
                    public_key.len()
                )));
            }

            let sealed = seal_anonymous(&public_key, share.as_bytes())
                .context("failed to encrypt decryption share")?;

            shares.push(EncryptedShares {
                encryption_key: encryption_key.clone(),
                shares: vec![hex::encode(sealed)],
            });
        }

        Ok(SecretResponse {
            id: Some(id),
            result: Some(secret_response::Result::Data(SecretData {
                encrypted_value: hex::encode(&secret.encrypted_secret),
                encrypted_decryption_key_shares: shares,
            })),
        })
    }

    // =========================================================================
    // CreateSecrets / UpdateSecrets
    // =========================================================================

    fn observe_create_secrets(
        &self,
        req: &CreateSecretsRequest,
    ) -> CreateSecretsResponse {
        let responses = self
            .observe_encrypted_secrets(
                RequestType::CreateSecrets,
                &req.request_id,
                &req.encrypted_secrets,
            )
            .into_iter()
            .map(|(id, error)| CreateSecretResponse {
                id,
                success: false,
                error,
            })
            .collect();
        CreateSecretsResponse { responses }
    }

    fn observe_update_secrets(
        &self,
        req: &UpdateSecretsRequest,
    ) -> UpdateSecretsResponse {
        let responses = self
            .observe_encrypted_secrets(
                RequestType::UpdateSecrets,
                &req.request_id,
                &req.encrypted_secrets,
            )
            .into_iter()
            .map(|(id, error)| UpdateSecretResponse {
                id,
                success: false,
                error,
            })
            .collect();
        UpdateSecretsResponse { responses }
    }

    /// Shared create/update checks.
    ///
    /// Returns `(id, error)` per item: the validated id with an empty error,
    /// or the id as submitted with the client-facing error text. `success`
    /// stays false until the write is applied in state transition.
    fn observe_encrypted_secrets(
        &self,
        kind: RequestType,
        request_id: &str,
        items: &[EncryptedSecret],
    ) -> Vec<(Option<SecretIdentifier>, String)> {
        let counts = count_keys(items.iter().map(|item| item.id.as_ref()));

        items
            .iter()
            .map(|item| match self.observe_encrypted_secret(item, &counts) {
                Ok(id) => {
                    debug!(request_id = %request_id, request_type = kind.as_str_name(), item = %key_for(&id), "observed write request item");
                    (Some(id), String::new())
                }
                Err(err) => {
                    log_item_error(kind, request_id, &key_for_optional(item.id.as_ref()), &err);
                    (item.id.clone(), err.client_message(kind))
                }
            })
            .collect()
    }

    fn observe_encrypted_secret(
        &self,
        item: &EncryptedSecret,
        counts: &HashMap<String, usize>,
    ) -> ItemResult<SecretIdentifier> {
        let id = validate_identifier(item.id.as_ref(), &self.config.identifier_limits)?;

        if counts
            .get(&key_for_optional(item.id.as_ref()))
            .copied()
            .unwrap_or(0)
            > 1
        {
            return Err(ItemError::user(format!(
                "duplicate request for secret identifier {}",
                key_for(&id)
            )));
        }

        let raw = hex::decode(&item.encrypted_value)
            .map_err(|e| ItemError::user(format!("invalid hex encoding for ciphertext: {e}")))?;

        if raw.len() > self.config.max_ciphertext_length_bytes {
            return Err(ItemError::user(format!(
                "ciphertext size exceeds maximum allowed size: {} bytes",
                self.config.max_ciphertext_length_bytes
            )));
        }

        self.key_material
            .public_key
            .unmarshal_verify(&raw)
            .map_err(|e| ItemError::user(format!("failed to verify ciphertext: {e}")))?;

        Ok(id)
    }

    // =========================================================================
    // DeleteSecrets
    // =========================================================================

    fn observe_delete_secrets(
        &self,
        store: &ReadStore<'_>,
        req: &DeleteSecretsRequest,
    ) -> DeleteSecretsResponse {
        let counts = count_keys(req.ids.iter().map(Some));

        let responses = req
            .ids
            .iter()
            .map(|raw| match self.observe_delete_secret(store, raw, &counts) {
                Ok(id) => {
                    debug!(request_id = %req.request_id, item = %key_for(&id), "observed delete secret request item");
                    DeleteSecretResponse {
                        id: Some(id),
                        success: false,
                        error: String::new(),
                    }
                }
                Err(err) => {
                    log_item_error(RequestType::DeleteSecrets, &req.request_id, &key_for(raw), &err);
                    DeleteSecretResponse {
                        id: Some(raw.clone()),
                        success: false,
                        error: err.client_message(RequestType::DeleteSecrets),
                    }
                }
            })
            .collect();

        DeleteSecretsResponse { responses }
    }

    fn observe_delete_secret(
        &self,
        store: &ReadStore<'_>,
        raw: &SecretIdentifier,
        counts: &HashMap<String, usize>,
    ) -> ItemResult<SecretIdentifier> {
        let id = validate_identifier(Some(raw), &self.config.identifier_limits)?;

        if counts.get(&key_for(raw)).copied().unwrap_or(0) > 1 {
            return Err(ItemError::user(format!(
                "duplicate request for secret identifier {}",
                key_for(&id)
            )));
        }

        store
            .get_secret(&id)
            .context("failed to read secret from key-value store")?
            .ok_or_else(|| ItemError::user("key does not exist"))?;

        Ok(id)
    }

    // =========================================================================
    // ListSecretIdentifiers
    // =========================================================================

    fn observe_list_secret_identifiers(
        &self,
        store: &ReadStore<'_>,
        req: &ListSecretIdentifiersRequest,
    ) -> ListSecretIdentifiersResponse {
        match list_secret_identifiers(store, req) {
            Ok(resp) => {
                debug!(request_id = %req.request_id, owner = %req.owner, "observed list secret identifiers request");
                resp
            }
            Err(err) => {
                log_item_error(
                    RequestType::ListSecretIdentifiers,
                    &req.request_id,
                    &req.owner,
                    &err,
                );
                ListSecretIdentifiersResponse {
                    identifiers: Vec::new(),
                    success: false,
                    error: err.client_message(RequestType::ListSecretIdentifiers),
                }
            }
        }
    }
}

/// Owner's identifiers sorted by (namespace, key), optionally filtered by namespace.
fn list_secret_identifiers(
    store: &ReadStore<'_>,
    req: &ListSecretIdentifiersRequest,
) -> ItemResult<ListSecretIdentifiersResponse> {
    if req.owner.is_empty() {
        return Err(ItemError::user("invalid request: owner cannot be empty"));
    }

    let Some(metadata) = store
        .get_metadata(&req.owner)
        .context("failed to get metadata for owner")?
    else {
        return Ok(ListSecretIdentifiersResponse {
            identifiers: Vec::new(),
            success: true,
            error: String::new(),
        });
    };

    let mut identifiers = metadata.secret_identifiers;
    identifiers.sort_by(|a, b| (&a.namespace, &a.key).cmp(&(&b.namespace, &b.key)));
    if !req.namespace.is_empty() {
        identifiers.retain(|id| id.namespace == req.namespace);
    }

    Ok(ListSecretIdentifiersResponse {
        identifiers,
        success: true,
        error: String::new(),
    })
}
