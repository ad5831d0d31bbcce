//! Driven ports (outbound dependencies)

use crate::domain::{PluginResult, ResultPackageValue, StoreResult, VaultRequest};
use async_trait::async_trait;
use vault_types::VaultResponse;

/// Read access to the replicated key-value store.
///
/// Keys and values are opaque; the plugin owns all prefixing and encoding.
pub trait KeyValueReader {
    fn read(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;
}

/// Read-write access to the replicated key-value store.
///
/// Only handed to the plugin during state transition.
pub trait KeyValueReadWriter: KeyValueReader {
    fn write(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;
    fn delete(&self, key: &[u8]) -> StoreResult<()>;
}

/// Persistence of DKG result packages, keyed by DKG instance id.
#[async_trait]
pub trait ResultPackageDatabase: Send + Sync {
    async fn read_result_package(&self, instance_id: &str)
        -> PluginResult<Option<ResultPackageValue>>;

    /// Insert or replace the package for `instance_id`.
    async fn write_result_package(
        &self,
        instance_id: &str,
        value: ResultPackageValue,
    ) -> PluginResult<()>;
}

/// Local queue of client requests waiting for a report.
pub trait RequestQueue: Send + Sync {
    /// Oldest `n` pending requests. Does not remove them.
    fn first_n(&self, n: usize) -> PluginResult<Vec<VaultRequest>>;

    /// Deliver the final response for `id`.
    ///
    /// Returns false if no caller is waiting on `id` at this node.
    fn respond(&self, id: &str, response: VaultResponse) -> bool;
}
