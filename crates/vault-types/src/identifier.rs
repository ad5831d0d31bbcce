//! Canonical string keys for secret identifiers.
//!
//! The canonical key is `owner::namespace::key` with an empty namespace
//! replaced by [`DEFAULT_NAMESPACE`]. It is used for map keying, duplicate
//! detection, sub-item ordering and as the suffix of the raw store key, so it
//! must be identical on every node.

use crate::messages::SecretIdentifier;
use std::fmt;

/// Namespace assigned to identifiers that do not specify one.
pub const DEFAULT_NAMESPACE: &str = "main";

/// Key used in place of a missing identifier when counting sub-items.
pub const NIL_IDENTIFIER_KEY: &str = "<nil>";

/// Separator between identifier components in the canonical key.
pub const KEY_SEPARATOR: &str = "::";

/// Canonical key for an identifier.
pub fn key_for(id: &SecretIdentifier) -> String {
    let namespace = if id.namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        id.namespace.as_str()
    };
    format!("{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}", id.owner, namespace, id.key)
}

/// Canonical key for an optional identifier; `None` maps to [`NIL_IDENTIFIER_KEY`].
pub fn key_for_optional(id: Option<&SecretIdentifier>) -> String {
    match id {
        Some(id) => key_for(id),
        None => NIL_IDENTIFIER_KEY.to_string(),
    }
}

impl SecretIdentifier {
    /// Build an identifier from its three components.
    pub fn new(owner: impl Into<String>, namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for SecretIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "owner:{:?} namespace:{:?} key:{:?}",
            self.owner, self.namespace, self.key
        )
    }
}
