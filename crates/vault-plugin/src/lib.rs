//! # vault-plugin
//!
//! OCR3.1 reporting plugin for the vault committee.
//!
//! ## Architecture
//!
//! Clients submit secret requests to any node. Each round, every oracle
//! observes its oldest pending requests against its view of the replicated
//! key-value store. Requests that at least 2f+1 oracles observed identically
//! become outcomes; writes are applied during state transition and a signed
//! report is produced per outcome.
//!
//! ```text
//! client ──→ RequestIntake ──→ RequestStore
//!                                   │ first_n
//!                                   ↓
//!           observation ──→ validate / quorum ──→ state_transition ──→ reports
//!                                                        │ writes
//!                                                        ↓
//!                                                 replicated KV store
//!
//! attested report ──→ VaultTransmitter ──→ RequestStore::respond ──→ client
//! ```
//!
//! Decryption shares for GetSecrets are produced per oracle and sealed to the
//! client's X25519 keys. They are excluded from the agreement hash and merged
//! across the agreeing oracles.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_plugin::service::ReportingPluginFactory;
//!
//! let factory = ReportingPluginFactory::new(store, db, key_loader, lazy_public_key);
//! let (plugin, info) = factory.new_reporting_plugin(&ocr_config).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{expiry_task, InMemoryKeyValueStore, InMemoryResultPackageDb, RequestStore};
pub use domain::{
    ItemError, OcrConfig, PluginConfig, PluginError, PluginResult, ReportingPluginInfo,
    RoundContext, VaultRequest,
};
pub use ports::{ContractTransmitter, ReportingPlugin};
pub use service::{
    ReportingPluginFactory, RequestIntake, VaultReportingPlugin, VaultTransmitter,
};
