//! Structural checks on a peer's observation set.
//!
//! A peer's observation bytes are rejected as a whole if any single
//! observation is malformed. The host then drops that peer for the round.

use super::VaultReportingPlugin;
use crate::domain::{observation_count_reaches_quorum, PluginError, PluginResult};
use prost::Message;
use std::collections::HashSet;
use vault_types::{
    key_for, key_for_optional, EncryptedSecret, Observation, Observations, RequestPayload as Req,
    RequestType, ResponsePayload as Resp, NIL_IDENTIFIER_KEY,
};

fn invalid(msg: impl Into<String>) -> PluginError {
    PluginError::InvalidObservation(msg.into())
}

fn display_id(s: &EncryptedSecret) -> String {
    s.id.as_ref()
        .map_or_else(|| NIL_IDENTIFIER_KEY.to_string(), ToString::to_string)
}

/// Reject repeated identifiers within one write or delete request.
fn ensure_unique(
    kind: &str,
    keys: impl Iterator<Item = (String, String)>,
) -> PluginResult<()> {
    let mut seen = HashSet::new();
    for (key, display) in keys {
        if !seen.insert(key) {
            return Err(invalid(format!(
                "{kind} requests cannot contain duplicate request for a given secret identifier: {display}"
            )));
        }
    }
    Ok(())
}

/// Check one observation's request/response pairing.
pub(crate) fn validate_single_observation(o: &Observation) -> PluginResult<()> {
    if o.id.is_empty() {
        return Err(invalid("observation id cannot be empty"));
    }

    match o.request_type() {
        RequestType::GetSecrets => {
            let (Some(Req::GetSecrets(req)), Some(Resp::GetSecrets(resp))) = (&o.request, &o.response)
            else {
                return Err(invalid("GetSecrets observation must have both request and response"));
            };
            if req.requests.len() != resp.responses.len() {
                return Err(invalid(
                    "GetSecrets request and response must have the same number of items",
                ));
            }
        }
        RequestType::CreateSecrets => {
            let (Some(Req::CreateSecrets(req)), Some(Resp::CreateSecrets(resp))) =
                (&o.request, &o.response)
            else {
                return Err(invalid(
                    "CreateSecrets observation must have both request and response",
                ));
            };
            if req.encrypted_secrets.len() != resp.responses.len() {
                return Err(invalid(
                    "CreateSecrets request and response must have the same number of items",
                ));
            }
            ensure_unique(
                "CreateSecrets",
                req.encrypted_secrets.iter().map(|s| (key_for_optional(s.id.as_ref()), display_id(s))),
            )?;
        }
        RequestType::UpdateSecrets => {
            let (Some(Req::UpdateSecrets(req)), Some(Resp::UpdateSecrets(resp))) =
                (&o.request, &o.response)
            else {
                return Err(invalid(
                    "UpdateSecrets observation must have both request and response",
                ));
            };
            if req.encrypted_secrets.len() != resp.responses.len() {
                return Err(invalid(
                    "UpdateSecrets request and response must have the same number of items",
                ));
            }
            ensure_unique(
                "UpdateSecrets",
                req.encrypted_secrets.iter().map(|s| (key_for_optional(s.id.as_ref()), display_id(s))),
            )?;
        }
        RequestType::DeleteSecrets => {
            let (Some(Req::DeleteSecrets(req)), Some(Resp::DeleteSecrets(resp))) =
                (&o.request, &o.response)
            else {
                return Err(invalid(
                    "DeleteSecrets observation must have both request and response",
                ));
            };
            if req.ids.len() != resp.responses.len() {
                return Err(invalid(
                    "DeleteSecrets request and response must have the same number of items",
                ));
            }
            ensure_unique(
                "DeleteSecrets",
                req.ids.iter().map(|id| (key_for(id), id.to_string())),
            )?;
        }
        RequestType::ListSecretIdentifiers => {
            let (Some(Req::ListSecretIdentifiers(_)), Some(Resp::ListSecretIdentifiers(_))) =
                (&o.request, &o.response)
            else {
                return Err(invalid(
                    "ListSecretIdentifiers observation must have both request and response",
                ));
            };
        }
        RequestType::Unspecified => {
            return Err(invalid(format!(
                "invalid observation type: {}",
                RequestType::Unspecified.as_str_name()
            )));
        }
    }

    Ok(())
}

impl VaultReportingPlugin {
    pub(crate) fn check_observation(&self, observation: &[u8]) -> PluginResult<()> {
        let obs = Observations::decode(observation).map_err(PluginError::ObservationDecode)?;

        let mut ids = HashSet::with_capacity(obs.observations.len());
        for o in &obs.observations {
            validate_single_observation(o)?;
            if !ids.insert(o.id.as_str()) {
                return Err(invalid(
                    "a single observation cannot contain duplicate observations for the same request id",
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn has_quorum(&self, count: usize) -> bool {
        observation_count_reaches_quorum(self.n, self.f, count)
    }
}
