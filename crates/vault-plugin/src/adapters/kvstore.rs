//! # Vault Key-Value Store Adapter
//!
//! Maps secrets and per-owner metadata onto the raw replicated store.
//!
//! ```text
//! "Key::<owner>::<namespace>::<key>"  →  StoredSecret
//! "Metadata::<owner>"                 →  StoredMetadata (identifier index)
//! ```
//!
//! Existence is gated on metadata. Writes store the value before indexing it;
//! deletes unindex before removing the value. A crash between the two steps
//! therefore leaves at worst an orphaned, unreachable value, which a later
//! create simply overwrites.

use crate::domain::{StoreError, StoreResult};
use crate::ports::{KeyValueReadWriter, KeyValueReader};
use prost::Message;
use vault_types::{key_for, SecretIdentifier, StoredMetadata, StoredSecret};

const KEY_PREFIX: &str = "Key::";
const METADATA_PREFIX: &str = "Metadata::";

fn secret_key(id: &SecretIdentifier) -> Vec<u8> {
    format!("{KEY_PREFIX}{}", key_for(id)).into_bytes()
}

fn metadata_key(owner: &str) -> Vec<u8> {
    format!("{METADATA_PREFIX}{owner}").into_bytes()
}

/// Typed view over a raw key-value capability.
///
/// Read methods are available for any [`KeyValueReader`]; mutating methods
/// require a [`KeyValueReadWriter`].
pub struct VaultStore<'a, K: ?Sized> {
    kv: &'a K,
}

impl<'a, K: KeyValueReader + ?Sized> VaultStore<'a, K> {
    pub fn new(kv: &'a K) -> Self {
        Self { kv }
    }

    /// Secret stored under `id`, or `None` if the owner's index does not list it.
    pub fn get_secret(&self, id: &SecretIdentifier) -> StoreResult<Option<StoredSecret>> {
        let Some(metadata) = self.get_metadata(&id.owner)? else {
            return Ok(None);
        };

        let wanted = key_for(id);
        if !metadata
            .secret_identifiers
            .iter()
            .any(|existing| key_for(existing) == wanted)
        {
            return Ok(None);
        }

        let raw = self
            .kv
            .read(&secret_key(id))?
            .ok_or(StoreError::MissingSecretValue)?;
        Ok(Some(StoredSecret::decode(raw.as_slice())?))
    }

    pub fn get_metadata(&self, owner: &str) -> StoreResult<Option<StoredMetadata>> {
        match self.kv.read(&metadata_key(owner))? {
            Some(raw) => Ok(Some(StoredMetadata::decode(raw.as_slice())?)),
            None => Ok(None),
        }
    }

    pub fn get_secret_identifiers_count_for_owner(&self, owner: &str) -> StoreResult<usize> {
        Ok(self
            .get_metadata(owner)?
            .map(|m| m.secret_identifiers.len())
            .unwrap_or(0))
    }
}

impl<'a, K: KeyValueReadWriter + ?Sized> VaultStore<'a, K> {
    /// Store `secret` and add `id` to the owner's index if missing.
    pub fn write_secret(&self, id: &SecretIdentifier, secret: &StoredSecret) -> StoreResult<()> {
        self.kv.write(&secret_key(id), &secret.encode_to_vec())?;

        let mut metadata = self.get_metadata(&id.owner)?.unwrap_or_default();
        let wanted = key_for(id);
        if metadata
            .secret_identifiers
            .iter()
            .any(|existing| key_for(existing) == wanted)
        {
            return Ok(());
        }

        metadata.secret_identifiers.push(id.clone());
        self.write_metadata(&id.owner, Some(&metadata))
    }

    pub fn write_metadata(&self, owner: &str, metadata: Option<&StoredMetadata>) -> StoreResult<()> {
        let metadata = metadata.ok_or(StoreError::NilMetadata)?;
        self.kv.write(&metadata_key(owner), &metadata.encode_to_vec())
    }

    /// Remove `id` from the owner's index, then delete its value.
    pub fn delete_secret(&self, id: &SecretIdentifier) -> StoreResult<()> {
        let mut metadata = self
            .get_metadata(&id.owner)?
            .ok_or_else(|| StoreError::NoMetadata(id.owner.clone()))?;

        let wanted = key_for(id);
        let before = metadata.secret_identifiers.len();
        metadata
            .secret_identifiers
            .retain(|existing| key_for(existing) != wanted);
        if metadata.secret_identifiers.len() == before {
            return Err(StoreError::IdNotInMetadata {
                key: wanted,
                owner: id.owner.clone(),
            });
        }

        self.write_metadata(&id.owner, Some(&metadata))?;
        self.kv.delete(&secret_key(id))
    }
}
