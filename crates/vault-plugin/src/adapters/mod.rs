//! Adapters layer
//!
//! - kvstore: typed secret/metadata view over the raw replicated store
//! - memory_kv: in-memory raw store for tests and local committees
//! - request_store: pending client requests and response delivery
//! - result_package_db: in-memory DKG result package persistence

mod kvstore;
mod memory_kv;
mod request_store;
mod result_package_db;

pub use kvstore::VaultStore;
pub use memory_kv::InMemoryKeyValueStore;
pub use request_store::{expiry_task, RequestStore, RequestStoreStats};
pub use result_package_db::InMemoryResultPackageDb;
