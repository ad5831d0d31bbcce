//! # State Transition
//!
//! Aggregates every oracle's observations into one outcome per request id
//! and applies the agreed writes to the replicated store.
//!
//! ```text
//! observations ──group by id──→ hash (shares stripped) ──bucket──→ 2f+1 bucket?
//!                                                                   │ yes
//!                           canonical request + response ←──────────┘
//!                           (writes applied exactly once)
//! ```
//!
//! Per-id outcomes are deterministic across honest oracles. The order of
//! outcomes across ids is not.

use super::VaultReportingPlugin;
use crate::adapters::VaultStore;
use crate::domain::{
    byzantine_quorum, generic_error_message, AttributedObservation, ItemError, ItemResult,
    PluginResult, RoundContext,
};
use crate::metrics;
use crate::ports::KeyValueReadWriter;
use anyhow::Context;
use prost::Message;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, warn};
use vault_crypto::sha256_hex;
use vault_types::{
    key_for, key_for_optional, CreateSecretResponse, CreateSecretsRequest, CreateSecretsResponse,
    DeleteSecretResponse, DeleteSecretsRequest, DeleteSecretsResponse, EncryptedSecret,
    GetSecretsRequest, GetSecretsResponse, Observation, Observations, Outcome, Outcomes,
    RequestPayload, RequestType, ResponsePayload, SecretIdentifier, SecretResponse, StoredSecret,
    UpdateSecretResponse, UpdateSecretsRequest, UpdateSecretsResponse,
};

type WriteStore<'a> = VaultStore<'a, dyn KeyValueReadWriter + 'a>;

const MISSING_REQUEST_ERROR: &str = "internal error: could not find request for response";

/// Content hash of an observation, ignoring per-oracle decryption shares.
pub(crate) fn observation_digest(o: &Observation) -> String {
    let mut o = o.clone();
    if let Some(ResponsePayload::GetSecrets(resp)) = &mut o.response {
        for r in &mut resp.responses {
            if let Some(data) = r.data_mut() {
                data.encrypted_decryption_key_shares.clear();
            }
        }
    }
    sha256_hex(&o.encode_to_vec())
}

/// Result of one write sub-item after state transition.
struct WriteResult {
    id: Option<SecretIdentifier>,
    success: bool,
    error: String,
}

impl WriteResult {
    fn applied(id: Option<SecretIdentifier>) -> Self {
        Self {
            id,
            success: true,
            error: String::new(),
        }
    }

    fn failed(id: Option<SecretIdentifier>, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error: error.into(),
        }
    }
}

fn require_id(id: Option<&SecretIdentifier>) -> ItemResult<&SecretIdentifier> {
    id.ok_or_else(|| ItemError::internal(anyhow::anyhow!("secret identifier is missing")))
}

fn decode_ciphertext(encrypted_value: &str) -> ItemResult<Vec<u8>> {
    hex::decode(encrypted_value)
        .map_err(|e| ItemError::user(format!("could not decode secret value: invalid hex: {e}")))
}

impl VaultReportingPlugin {
    pub(crate) fn apply_state_transition(
        &self,
        ctx: &RoundContext,
        seq_nr: u64,
        aos: &[AttributedObservation],
        kv: &dyn KeyValueReadWriter,
    ) -> PluginResult<Vec<u8>> {
        let mut by_id: HashMap<String, Vec<Observation>> = HashMap::new();
        for ao in aos {
            let obs = match Observations::decode(ao.observation.as_slice()) {
                Ok(obs) => obs,
                Err(err) => {
                    error!(observer = ao.observer, error = %err, "failed to unmarshal observations");
                    continue;
                }
            };
            for o in obs.observations {
                by_id.entry(o.id.clone()).or_default().push(o);
            }
        }

        let threshold = byzantine_quorum(self.f);
        let store: WriteStore<'_> = VaultStore::new(kv);
        let mut outcomes = Vec::new();

        for (id, group) in by_id {
            ctx.check()?;

            let Some(chosen) = choose_agreed(&id, group, threshold) else {
                warn!(request_id = %id, threshold, "insufficient observations found for id");
                metrics::record_quorum_miss();
                continue;
            };

            if let Some(outcome) = self.build_outcome(&store, &id, &chosen) {
                outcomes.push(outcome);
            }
        }

        if !outcomes.is_empty() {
            debug!(seq_nr, count = outcomes.len(), "state transition complete");
            metrics::record_outcomes_emitted(outcomes.len());
        }

        Ok(Outcomes { outcomes }.encode_to_vec())
    }

    fn build_outcome(
        &self,
        store: &WriteStore<'_>,
        id: &str,
        chosen: &[Observation],
    ) -> Option<Outcome> {
        let first = chosen.first()?;
        let request_type = first.request_type();

        let (request, response) = match (&first.request, &first.response) {
            (Some(RequestPayload::GetSecrets(req)), Some(ResponsePayload::GetSecrets(_))) => {
                let (req, resp) = aggregate_get_secrets(req, chosen);
                (RequestPayload::GetSecrets(req), ResponsePayload::GetSecrets(resp))
            }
            (Some(RequestPayload::CreateSecrets(req)), Some(ResponsePayload::CreateSecrets(resp))) => {
                let (req, resp) = self.transition_create_secrets(store, req, resp);
                (RequestPayload::CreateSecrets(req), ResponsePayload::CreateSecrets(resp))
            }
            (Some(RequestPayload::UpdateSecrets(req)), Some(ResponsePayload::UpdateSecrets(resp))) => {
                let (req, resp) = self.transition_update_secrets(store, req, resp);
                (RequestPayload::UpdateSecrets(req), ResponsePayload::UpdateSecrets(resp))
            }
            (Some(RequestPayload::DeleteSecrets(req)), Some(ResponsePayload::DeleteSecrets(resp))) => {
                let (req, resp) = self.transition_delete_secrets(store, req, resp);
                (RequestPayload::DeleteSecrets(req), ResponsePayload::DeleteSecrets(resp))
            }
            (
                Some(RequestPayload::ListSecretIdentifiers(req)),
                Some(ResponsePayload::ListSecretIdentifiers(resp)),
            ) => (
                RequestPayload::ListSecretIdentifiers(req.clone()),
                ResponsePayload::ListSecretIdentifiers(resp.clone()),
            ),
            _ => {
                debug!(request_id = %id, request_type = request_type.as_str_name(), "unknown request type, skipping");
                return None;
            }
        };

        Some(Outcome {
            id: first.id.clone(),
            request_type: request_type.into(),
            request: Some(request),
            response: Some(response),
        })
    }

    // =========================================================================
    // CreateSecrets / UpdateSecrets
    // =========================================================================

    fn transition_create_secrets(
        &self,
        store: &WriteStore<'_>,
        req: &CreateSecretsRequest,
        resp: &CreateSecretsResponse,
    ) -> (CreateSecretsRequest, CreateSecretsResponse) {
        let (items, results) = self.transition_encrypted_secrets(
            RequestType::CreateSecrets,
            store,
            &req.request_id,
            &req.encrypted_secrets,
            resp.responses.iter().map(|r| (r.id.as_ref(), r.error.as_str())),
        );

        let responses = results
            .into_iter()
            .map(|r| CreateSecretResponse {
                id: r.id,
                success: r.success,
                error: r.error,
            })
            .collect();

        (
            CreateSecretsRequest {
                request_id: req.request_id.clone(),
                encrypted_secrets: items,
            },
            CreateSecretsResponse { responses },
        )
    }

    fn transition_update_secrets(
        &self,
        store: &WriteStore<'_>,
        req: &UpdateSecretsRequest,
        resp: &UpdateSecretsResponse,
    ) -> (UpdateSecretsRequest, UpdateSecretsResponse) {
        let (items, results) = self.transition_encrypted_secrets(
            RequestType::UpdateSecrets,
            store,
            &req.request_id,
            &req.encrypted_secrets,
            resp.responses.iter().map(|r| (r.id.as_ref(), r.error.as_str())),
        );

        let responses = results
            .into_iter()
            .map(|r| UpdateSecretResponse {
                id: r.id,
                success: r.success,
                error: r.error,
            })
            .collect();

        (
            UpdateSecretsRequest {
                request_id: req.request_id.clone(),
                encrypted_secrets: items,
            },
            UpdateSecretsResponse { responses },
        )
    }

    /// Canonical request items plus one result per observed response, both
    /// sorted by identifier key.
    fn transition_encrypted_secrets<'r>(
        &self,
        kind: RequestType,
        store: &WriteStore<'_>,
        request_id: &str,
        items: &[EncryptedSecret],
        responses: impl Iterator<Item = (Option<&'r SecretIdentifier>, &'r str)>,
    ) -> (Vec<EncryptedSecret>, Vec<WriteResult>) {
        let requests: BTreeMap<String, &EncryptedSecret> = items
            .iter()
            .map(|item| (key_for_optional(item.id.as_ref()), item))
            .collect();
        let responses: BTreeMap<String, (Option<&SecretIdentifier>, &str)> = responses
            .map(|(id, error)| (key_for_optional(id), (id, error)))
            .collect();

        let mut results = Vec::with_capacity(responses.len());
        for (key, (resp_id, prior_error)) in &responses {
            let Some(item) = requests.get(key) else {
                error!(request_id = %request_id, item = %key, "could not find request for response");
                results.push(WriteResult::failed(resp_id.cloned(), MISSING_REQUEST_ERROR));
                continue;
            };

            let applied = match kind {
                RequestType::CreateSecrets => self.apply_create(store, item, prior_error),
                _ => apply_update(store, item, prior_error),
            };

            match applied {
                Ok(()) => {
                    debug!(request_id = %request_id, request_type = kind.as_str_name(), item = %key, "successfully wrote secret to key value store");
                    results.push(WriteResult::applied(item.id.clone()));
                }
                Err(err) => {
                    log_transition_error(kind, request_id, key, &err);
                    results.push(WriteResult::failed(item.id.clone(), err.client_message(kind)));
                }
            }
        }

        let items = requests.into_values().cloned().collect();
        (items, results)
    }

    fn apply_create(
        &self,
        store: &WriteStore<'_>,
        item: &EncryptedSecret,
        prior_error: &str,
    ) -> ItemResult<()> {
        if !prior_error.is_empty() {
            return Err(ItemError::user(prior_error));
        }

        let ciphertext = decode_ciphertext(&item.encrypted_value)?;
        let id = require_id(item.id.as_ref())?;

        if store
            .get_secret(id)
            .context("failed to read secret from key-value store")?
            .is_some()
        {
            return Err(ItemError::user(
                "could not write to key value store: key already exists",
            ));
        }

        let count = store
            .get_secret_identifiers_count_for_owner(&id.owner)
            .context("failed to read secret identifiers count for owner")?;
        let max = self.config.max_secrets_per_owner;
        if count + 1 > max {
            return Err(ItemError::user(format!(
                "could not write to key value store: owner {} has reached maximum number of secrets ({max})",
                id.owner
            )));
        }

        store
            .write_secret(
                id,
                &StoredSecret {
                    encrypted_secret: ciphertext,
                },
            )
            .context("failed to write secret to key value store")?;
        Ok(())
    }

    // =========================================================================
    // DeleteSecrets
    // =========================================================================

    fn transition_delete_secrets(
        &self,
        store: &WriteStore<'_>,
        req: &DeleteSecretsRequest,
        resp: &DeleteSecretsResponse,
    ) -> (DeleteSecretsRequest, DeleteSecretsResponse) {
        let requests: BTreeMap<String, &SecretIdentifier> =
            req.ids.iter().map(|id| (key_for(id), id)).collect();
        let observed_responses: BTreeMap<String, &DeleteSecretResponse> = resp
            .responses
            .iter()
            .map(|r| (key_for_optional(r.id.as_ref()), r))
            .collect();

        let mut responses = Vec::with_capacity(observed_responses.len());
        for (key, observed) in &observed_responses {
            let Some(id) = requests.get(key) else {
                error!(request_id = %req.request_id, item = %key, "could not find request for response");
                responses.push(DeleteSecretResponse {
                    id: observed.id.clone(),
                    success: false,
                    error: MISSING_REQUEST_ERROR.to_string(),
                });
                continue;
            };

            match apply_delete(store, id, &observed.error) {
                Ok(()) => {
                    debug!(request_id = %req.request_id, item = %key, "successfully deleted secret in key value store");
                    responses.push(DeleteSecretResponse {
                        id: Some((*id).clone()),
                        success: true,
                        error: String::new(),
                    });
                }
                Err(err) => {
                    log_transition_error(RequestType::DeleteSecrets, &req.request_id, key, &err);
                    responses.push(DeleteSecretResponse {
                        id: Some((*id).clone()),
                        success: false,
                        error: err.client_message(RequestType::DeleteSecrets),
                    });
                }
            }
        }

        (
            DeleteSecretsRequest {
                request_id: req.request_id.clone(),
                ids: requests.into_values().cloned().collect(),
            },
            DeleteSecretsResponse { responses },
        )
    }
}

fn apply_update(store: &WriteStore<'_>, item: &EncryptedSecret, prior_error: &str) -> ItemResult<()> {
    if !prior_error.is_empty() {
        return Err(ItemError::user(prior_error));
    }

    let ciphertext = decode_ciphertext(&item.encrypted_value)?;
    let id = require_id(item.id.as_ref())?;

    if store
        .get_secret(id)
        .context("failed to read secret from key-value store")?
        .is_none()
    {
        return Err(ItemError::user(
            "could not write update to key value store: key does not exist",
        ));
    }

    store
        .write_secret(
            id,
            &StoredSecret {
                encrypted_secret: ciphertext,
            },
        )
        .context("failed to write secret to key value store")?;
    Ok(())
}

fn apply_delete(store: &WriteStore<'_>, id: &SecretIdentifier, prior_error: &str) -> ItemResult<()> {
    if !prior_error.is_empty() {
        return Err(ItemError::user(prior_error));
    }

    store
        .delete_secret(id)
        .context("failed to delete secret from key value store")?;
    Ok(())
}

fn log_transition_error(kind: RequestType, request_id: &str, item: &str, err: &ItemError) {
    metrics::record_item_error(kind.as_str_name(), err.is_user());
    error!(
        request_id = %request_id,
        request_type = kind.as_str_name(),
        item = %item,
        error = %err,
        "{}",
        generic_error_message(kind)
    );
}

/// The largest bucket of identical observations holding at least
/// `threshold` members, so every agreeing oracle contributes its shares.
///
/// Ties go to the smallest digest.
fn choose_agreed(id: &str, group: Vec<Observation>, threshold: usize) -> Option<Vec<Observation>> {
    let mut buckets: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for o in group {
        buckets.entry(observation_digest(&o)).or_default().push(o);
    }

    let mut chosen: Option<(String, Vec<Observation>)> = None;
    for (digest, bucket) in buckets {
        if bucket.len() < threshold {
            continue;
        }
        if chosen.as_ref().map_or(true, |(_, best)| bucket.len() > best.len()) {
            chosen = Some((digest, bucket));
        }
    }

    let (digest, bucket) = chosen?;
    debug!(request_id = %id, sha = %digest, count = bucket.len(), threshold, "sufficient observations for sha");
    Some(bucket)
}

/// Canonical get request plus responses with every chosen oracle's shares merged.
fn aggregate_get_secrets(
    req: &GetSecretsRequest,
    chosen: &[Observation],
) -> (GetSecretsRequest, GetSecretsResponse) {
    let requests: BTreeMap<String, _> = req
        .requests
        .iter()
        .map(|r| (key_for_optional(r.id.as_ref()), r.clone()))
        .collect();

    let mut merged: BTreeMap<String, SecretResponse> = BTreeMap::new();
    for o in chosen {
        let Some(ResponsePayload::GetSecrets(resp)) = &o.response else {
            continue;
        };

        for rsp in &resp.responses {
            let key = key_for_optional(rsp.id.as_ref());
            let Some(existing) = merged.get_mut(&key) else {
                merged.insert(key, rsp.clone());
                continue;
            };

            let (Some(incoming), Some(data)) = (rsp.data(), existing.data_mut()) else {
                continue;
            };

            for shares in &incoming.encrypted_decryption_key_shares {
                match data
                    .encrypted_decryption_key_shares
                    .iter_mut()
                    .find(|s| s.encryption_key == shares.encryption_key)
                {
                    Some(target) => target.shares.extend(shares.shares.iter().cloned()),
                    None => error!(
                        item = %key,
                        encryption_key = %shares.encryption_key,
                        "unexpected encryption key in response"
                    ),
                }
            }
        }
    }

    // Shares identify their oracle, so a sorted list is independent of arrival order.
    for rsp in merged.values_mut() {
        if let Some(data) = rsp.data_mut() {
            for bundle in &mut data.encrypted_decryption_key_shares {
                bundle.shares.sort();
            }
        }
    }

    (
        GetSecretsRequest {
            requests: requests.into_values().collect(),
        },
        GetSecretsResponse {
            responses: merged.into_values().collect(),
        },
    )
}
