//! Secret identifier validation.

use super::config::IdentifierLimits;
use super::errors::{ItemError, ItemResult};
use vault_types::{SecretIdentifier, DEFAULT_NAMESPACE};

fn is_valid_component(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate `id` and return it with the namespace defaulted.
///
/// Checks run in a fixed order so every node reports the same first failure:
/// presence, empty key, empty owner, character set, then owner, namespace
/// and key lengths. Length limits apply to the fields as submitted, so a
/// defaulted namespace is never rejected for length.
pub fn validate_identifier(
    id: Option<&SecretIdentifier>,
    limits: &IdentifierLimits,
) -> ItemResult<SecretIdentifier> {
    let id = id.ok_or_else(|| ItemError::user("invalid secret identifier: cannot be nil"))?;

    if id.key.is_empty() {
        return Err(ItemError::user(
            "invalid secret identifier: key cannot be empty",
        ));
    }

    if id.owner.is_empty() {
        return Err(ItemError::user(
            "invalid secret identifier: owner cannot be empty",
        ));
    }

    let namespace = if id.namespace.is_empty() {
        DEFAULT_NAMESPACE.to_string()
    } else {
        id.namespace.clone()
    };

    if !is_valid_component(&id.key)
        || !is_valid_component(&id.owner)
        || !is_valid_component(&namespace)
    {
        return Err(ItemError::user(
            "invalid secret identifier: key, owner and namespace must only contain alphanumeric characters",
        ));
    }

    if id.owner.len() > limits.max_owner_length_bytes {
        return Err(ItemError::user(format!(
            "invalid secret identifier: owner exceeds maximum length of {} bytes",
            limits.max_owner_length_bytes
        )));
    }

    if id.namespace.len() > limits.max_namespace_length_bytes {
        return Err(ItemError::user(format!(
            "invalid secret identifier: namespace exceeds maximum length of {} bytes",
            limits.max_namespace_length_bytes
        )));
    }

    if id.key.len() > limits.max_key_length_bytes {
        return Err(ItemError::user(format!(
            "invalid secret identifier: key exceeds maximum length of {} bytes",
            limits.max_key_length_bytes
        )));
    }

    Ok(SecretIdentifier {
        owner: id.owner.clone(),
        namespace,
        key: id.key.clone(),
    })
}
