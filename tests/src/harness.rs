//! # Committee Harness
//!
//! Drives N oracles through complete rounds in-process, playing the part of
//! the OCR host: it collects observations, enforces validation and quorum,
//! runs state transition on every oracle's replica, signs reports with
//! per-oracle secp256k1 keys and hands them to every oracle's transmitter.

use k256::ecdsa::SigningKey;
use prost::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use tokio::sync::oneshot;
use vault_crypto::testing::{TestKeyLoader, TestScheme};
use vault_crypto::LazyPublicKey;
use vault_plugin::adapters::{InMemoryKeyValueStore, InMemoryResultPackageDb, RequestStore};
use vault_plugin::domain::{
    AttributedObservation, AttributedOnchainSignature, OcrConfig, OutcomeContext, PluginResult,
    ReportWithInfo, RequestStoreConfig, ResultPackageValue, RoundContext, VaultRequest,
};
use vault_plugin::ports::{ContractTransmitter, ReportingPlugin, ResultPackageDatabase};
use vault_plugin::service::{
    ReportingPluginFactory, RequestIntake, VaultReportingPlugin, VaultTransmitter,
};
use vault_telemetry::{init_tracing, TelemetryConfig};
use vault_types::signed::address_from_key;
use vault_types::{report_signing_digest, Outcome, Outcomes, SignerAddress, VaultResponse};

pub const DKG_INSTANCE_ID: &str = "dkg-instance-1";
pub const CONFIG_DIGEST: [u8; 32] = [0x5a; 32];

static LOGGING: Once = Once::new();

/// Install the node logging stack once per test binary.
///
/// Defaults to `warn` unless `VAULT_LOG_LEVEL` or `RUST_LOG` is set.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let mut config = TelemetryConfig::from_env();
        if std::env::var("VAULT_LOG_LEVEL").is_err() && std::env::var("RUST_LOG").is_err() {
            config.log_level = "warn".to_string();
        }
        let _ = init_tracing(&config);
    });
}

/// One committee member.
pub struct Oracle {
    pub index: u8,
    pub plugin: VaultReportingPlugin,
    pub store: Arc<RequestStore>,
    pub kv: InMemoryKeyValueStore,
    pub intake: RequestIntake,
    pub transmitter: VaultTransmitter,
    pub signing_key: SigningKey,
}

/// Everything the host saw in one round.
pub struct RoundResult {
    pub seq_nr: u64,
    /// Outcomes per oracle, sorted by request id
    pub outcomes: Vec<Vec<Outcome>>,
    /// Reports built by the first oracle
    pub reports: Vec<ReportWithInfo>,
}

impl RoundResult {
    /// Outcomes as seen by the first oracle.
    pub fn leader_outcomes(&self) -> &[Outcome] {
        &self.outcomes[0]
    }
}

pub struct Committee {
    pub oracles: Vec<Oracle>,
    pub scheme: TestScheme,
    pub n: usize,
    pub f: usize,
    seq_nr: AtomicU64,
}

fn signing_key(index: u8) -> SigningKey {
    let mut seed = [0x11u8; 32];
    seed[31] = index + 1;
    SigningKey::from_slice(&seed).expect("valid scalar")
}

/// Recoverable `r || s || v` signature over the report signing digest.
pub fn sign_report(key: &SigningKey, report: &[u8], context: &[u8]) -> Vec<u8> {
    let digest = report_signing_digest(report, context).expect("context long enough");
    let (sig, recid) = key
        .sign_prehash_recoverable(&digest)
        .expect("signing succeeds");
    let mut out = sig.to_bytes().to_vec();
    out.push(recid.to_byte());
    out
}

impl Committee {
    /// N=4, F=1 with default offchain configuration.
    pub async fn standard() -> Self {
        Self::new(4, 1, vault_types::ReportingPluginConfig::default()).await
    }

    pub async fn new(n: usize, f: usize, mut offchain: vault_types::ReportingPluginConfig) -> Self {
        init_logging();
        let scheme = TestScheme::new(0xC0FFEE, n as u8);
        let db = Arc::new(InMemoryResultPackageDb::new());
        db.write_result_package(
            DKG_INSTANCE_ID,
            ResultPackageValue {
                config_digest: CONFIG_DIGEST,
                seq_nr: 1,
                report_with_result_package: scheme.result_package(),
                signatures: vec![],
            },
        )
        .await
        .expect("in-memory write");

        offchain.dkg_instance_id = Some(DKG_INSTANCE_ID.to_string());
        let ocr = OcrConfig {
            config_digest: CONFIG_DIGEST,
            n,
            f,
            offchain_config: offchain.encode_to_vec(),
        };

        let mut oracles = Vec::with_capacity(n);
        for index in 0..n as u8 {
            let store = Arc::new(RequestStore::new(RequestStoreConfig::default()));
            let lazy = Arc::new(LazyPublicKey::new());
            let factory = ReportingPluginFactory::new(
                store.clone(),
                db.clone(),
                Arc::new(TestKeyLoader::new(index)),
                lazy.clone(),
            );
            let (plugin, _info) = factory
                .new_reporting_plugin(&ocr)
                .await
                .expect("plugin construction");

            oracles.push(Oracle {
                index,
                plugin,
                intake: RequestIntake::new(store.clone(), lazy),
                transmitter: VaultTransmitter::new(store.clone(), format!("oracle-{index}")),
                store,
                kv: InMemoryKeyValueStore::new(),
                signing_key: signing_key(index),
            });
        }

        Self {
            oracles,
            scheme,
            n,
            f,
            seq_nr: AtomicU64::new(0),
        }
    }

    /// Addresses of every committee signer.
    pub fn signer_addresses(&self) -> Vec<SignerAddress> {
        self.oracles
            .iter()
            .map(|o| address_from_key(o.signing_key.verifying_key()))
            .collect()
    }

    /// Hex ciphertext of `plaintext` under the committee key.
    pub fn encrypt_hex(&self, plaintext: &[u8]) -> String {
        hex::encode(self.scheme.encrypt(plaintext))
    }

    /// Submit `request` through every oracle's intake.
    ///
    /// Returns the receiver registered at each oracle.
    pub fn submit(&self, request: VaultRequest) -> PluginResult<Vec<oneshot::Receiver<VaultResponse>>> {
        self.oracles
            .iter()
            .map(|o| o.intake.submit(request.clone()))
            .collect()
    }

    /// Run a round in which every oracle observes honestly.
    pub async fn run_round(&self) -> RoundResult {
        let all: Vec<usize> = (0..self.n).collect();
        self.run_round_with(&all, |_, bytes| bytes).await
    }

    /// Run a round using only the observations of `observers`.
    ///
    /// `tamper` may rewrite an oracle's observation bytes before they are
    /// broadcast.
    pub async fn run_round_with<F>(&self, observers: &[usize], tamper: F) -> RoundResult
    where
        F: Fn(usize, Vec<u8>) -> Vec<u8>,
    {
        let seq_nr = self.seq_nr.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = RoundContext::new();
        let outctx = OutcomeContext { seq_nr };

        let mut aos = Vec::with_capacity(observers.len());
        for &i in observers {
            let oracle = &self.oracles[i];
            let bytes = oracle
                .plugin
                .observation(&ctx, &outctx, &[], &oracle.kv)
                .expect("observation");
            let ao = AttributedObservation {
                observation: tamper(i, bytes),
                observer: oracle.index,
            };
            if self.oracles[0]
                .plugin
                .validate_observation(&ctx, &outctx, &[], &ao)
                .is_ok()
            {
                aos.push(ao);
            }
        }

        let mut outcomes = Vec::with_capacity(self.n);
        let mut leader_outcome = Vec::new();
        let quorum = self.oracles[0]
            .plugin
            .observation_quorum(&ctx, &outctx, &[], &aos)
            .expect("quorum check");

        for oracle in &self.oracles {
            if !quorum {
                outcomes.push(Vec::new());
                continue;
            }
            let bytes = oracle
                .plugin
                .state_transition(&ctx, &outctx, &[], &aos, &oracle.kv)
                .expect("state transition");
            let mut decoded = Outcomes::decode(bytes.as_slice())
                .expect("outcome bytes")
                .outcomes;
            decoded.sort_by(|a, b| a.id.cmp(&b.id));
            if oracle.index == 0 {
                leader_outcome = bytes;
            }
            outcomes.push(decoded);
        }

        let reports = if quorum {
            self.oracles[0]
                .plugin
                .reports(&ctx, seq_nr, &leader_outcome)
                .expect("reports")
        } else {
            Vec::new()
        };

        self.transmit(seq_nr, &reports).await;

        RoundResult {
            seq_nr,
            outcomes,
            reports,
        }
    }

    /// Sign `reports` with f+1 oracles and deliver them at every oracle.
    async fn transmit(&self, seq_nr: u64, reports: &[ReportWithInfo]) {
        let context = vault_types::build_report_context(&CONFIG_DIGEST, seq_nr);
        for report in reports {
            let signatures: Vec<AttributedOnchainSignature> = self
                .oracles
                .iter()
                .take(self.f + 1)
                .map(|o| AttributedOnchainSignature {
                    signature: sign_report(&o.signing_key, &report.report, &context),
                    signer: o.index,
                })
                .collect();

            for oracle in &self.oracles {
                oracle
                    .transmitter
                    .transmit(CONFIG_DIGEST, seq_nr, report.clone(), signatures.clone())
                    .await
                    .expect("transmit");
            }
        }
    }
}
