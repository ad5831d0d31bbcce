//! Plugin configuration
//!
//! Offchain config arrives as a protobuf `ReportingPluginConfig` in which
//! every numeric field uses 0 for "unset". Unset fields fall back to the
//! defaults below.

use std::time::Duration;
use vault_types::ReportingPluginConfig;

pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_MAX_SECRETS_PER_OWNER: usize = 100;
pub const DEFAULT_MAX_CIPHERTEXT_LENGTH_BYTES: usize = 2048;
pub const DEFAULT_MAX_IDENTIFIER_KEY_LENGTH_BYTES: usize = 64;
pub const DEFAULT_MAX_IDENTIFIER_OWNER_LENGTH_BYTES: usize = 64;
pub const DEFAULT_MAX_IDENTIFIER_NAMESPACE_LENGTH_BYTES: usize = 64;

pub const DEFAULT_LIMITS_MAX_QUERY_LENGTH: usize = 100;
pub const DEFAULT_LIMITS_MAX_OBSERVATION_LENGTH: usize = 512_000;
pub const DEFAULT_LIMITS_MAX_REPORTS_PLUS_PRECURSOR_LENGTH: usize = 512_000;
pub const DEFAULT_LIMITS_MAX_REPORT_LENGTH: usize = 512_000;
pub const DEFAULT_LIMITS_MAX_REPORT_COUNT: usize = 20;
pub const DEFAULT_LIMITS_MAX_KEY_VALUE_MODIFIED_KEYS_PLUS_VALUES_LENGTH: usize = 1024 * 1024;
pub const DEFAULT_LIMITS_MAX_BLOB_PAYLOAD_LENGTH: usize = 1024 * 1024;

/// Name reported to the host.
pub const PLUGIN_NAME: &str = "VaultReportingPlugin";

fn or_default(value: u32, default: usize) -> usize {
    if value == 0 {
        default
    } else {
        value as usize
    }
}

/// Per-field identifier length bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifierLimits {
    pub max_key_length_bytes: usize,
    pub max_owner_length_bytes: usize,
    pub max_namespace_length_bytes: usize,
}

impl Default for IdentifierLimits {
    fn default() -> Self {
        Self {
            max_key_length_bytes: DEFAULT_MAX_IDENTIFIER_KEY_LENGTH_BYTES,
            max_owner_length_bytes: DEFAULT_MAX_IDENTIFIER_OWNER_LENGTH_BYTES,
            max_namespace_length_bytes: DEFAULT_MAX_IDENTIFIER_NAMESPACE_LENGTH_BYTES,
        }
    }
}

/// Resolved local configuration of one plugin instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginConfig {
    /// Pending requests observed per round
    pub batch_size: usize,
    /// Cap on live secrets per owner, enforced at state transition
    pub max_secrets_per_owner: usize,
    /// Cap on decoded ciphertext size
    pub max_ciphertext_length_bytes: usize,
    pub identifier_limits: IdentifierLimits,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_secrets_per_owner: DEFAULT_MAX_SECRETS_PER_OWNER,
            max_ciphertext_length_bytes: DEFAULT_MAX_CIPHERTEXT_LENGTH_BYTES,
            identifier_limits: IdentifierLimits::default(),
        }
    }
}

impl PluginConfig {
    /// Resolve from offchain config, substituting defaults for unset fields.
    pub fn from_offchain(cfg: &ReportingPluginConfig) -> Self {
        Self {
            batch_size: or_default(cfg.batch_size, DEFAULT_BATCH_SIZE),
            max_secrets_per_owner: or_default(
                cfg.max_secrets_per_owner,
                DEFAULT_MAX_SECRETS_PER_OWNER,
            ),
            max_ciphertext_length_bytes: or_default(
                cfg.max_ciphertext_length_bytes,
                DEFAULT_MAX_CIPHERTEXT_LENGTH_BYTES,
            ),
            identifier_limits: IdentifierLimits {
                max_key_length_bytes: or_default(
                    cfg.max_identifier_key_length_bytes,
                    DEFAULT_MAX_IDENTIFIER_KEY_LENGTH_BYTES,
                ),
                max_owner_length_bytes: or_default(
                    cfg.max_identifier_owner_length_bytes,
                    DEFAULT_MAX_IDENTIFIER_OWNER_LENGTH_BYTES,
                ),
                max_namespace_length_bytes: or_default(
                    cfg.max_identifier_namespace_length_bytes,
                    DEFAULT_MAX_IDENTIFIER_NAMESPACE_LENGTH_BYTES,
                ),
            },
        }
    }
}

/// Protocol wire limits reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportingPluginLimits {
    pub max_query_length: usize,
    pub max_observation_length: usize,
    pub max_reports_plus_precursor_length: usize,
    pub max_report_length: usize,
    pub max_report_count: usize,
    pub max_key_value_modified_keys_plus_values_length: usize,
    pub max_blob_payload_length: usize,
}

impl Default for ReportingPluginLimits {
    fn default() -> Self {
        Self {
            max_query_length: DEFAULT_LIMITS_MAX_QUERY_LENGTH,
            max_observation_length: DEFAULT_LIMITS_MAX_OBSERVATION_LENGTH,
            max_reports_plus_precursor_length: DEFAULT_LIMITS_MAX_REPORTS_PLUS_PRECURSOR_LENGTH,
            max_report_length: DEFAULT_LIMITS_MAX_REPORT_LENGTH,
            max_report_count: DEFAULT_LIMITS_MAX_REPORT_COUNT,
            max_key_value_modified_keys_plus_values_length:
                DEFAULT_LIMITS_MAX_KEY_VALUE_MODIFIED_KEYS_PLUS_VALUES_LENGTH,
            max_blob_payload_length: DEFAULT_LIMITS_MAX_BLOB_PAYLOAD_LENGTH,
        }
    }
}

impl ReportingPluginLimits {
    pub fn from_offchain(cfg: &ReportingPluginConfig) -> Self {
        let d = Self::default();
        Self {
            max_query_length: or_default(cfg.limits_max_query_length, d.max_query_length),
            max_observation_length: or_default(
                cfg.limits_max_observation_length,
                d.max_observation_length,
            ),
            max_reports_plus_precursor_length: or_default(
                cfg.limits_max_reports_plus_precursor_length,
                d.max_reports_plus_precursor_length,
            ),
            max_report_length: or_default(cfg.limits_max_report_length, d.max_report_length),
            max_report_count: or_default(cfg.limits_max_report_count, d.max_report_count),
            max_key_value_modified_keys_plus_values_length: or_default(
                cfg.limits_max_key_value_modified_keys_plus_values_length,
                d.max_key_value_modified_keys_plus_values_length,
            ),
            max_blob_payload_length: or_default(
                cfg.limits_max_blob_payload_length,
                d.max_blob_payload_length,
            ),
        }
    }
}

/// Plugin descriptor returned by the factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportingPluginInfo {
    pub name: String,
    pub limits: ReportingPluginLimits,
}

/// Committee parameters supplied by the host when instantiating a plugin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrConfig {
    pub config_digest: [u8; 32],
    /// Committee size
    pub n: usize,
    /// Maximum number of faulty oracles
    pub f: usize,
    /// Protobuf-encoded `ReportingPluginConfig`
    pub offchain_config: Vec<u8>,
}

/// Pending request store settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestStoreConfig {
    /// How long a request may wait for a report
    pub request_expiry: Duration,
    /// Interval of the expiry sweep
    pub sweep_interval: Duration,
}

impl Default for RequestStoreConfig {
    fn default() -> Self {
        Self {
            request_expiry: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(1),
        }
    }
}
