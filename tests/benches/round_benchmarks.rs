//! # Vault Round Benchmarks
//!
//! | Phase | Input |
//! |-------|-------|
//! | observation | full batch of create requests |
//! | state_transition | 2f+1 identical observations |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use vault_plugin::adapters::InMemoryKeyValueStore;
use vault_plugin::domain::{AttributedObservation, OutcomeContext, RoundContext, VaultRequest};
use vault_plugin::ports::ReportingPlugin;
use vault_tests::harness::Committee;
use vault_types::{
    CreateSecretsRequest, EncryptedSecret, ReportingPluginConfig, RequestPayload,
    SecretIdentifier,
};

fn committee_with_creates(rt: &tokio::runtime::Runtime, requests: usize) -> Committee {
    let offchain = ReportingPluginConfig {
        batch_size: requests as u32,
        ..Default::default()
    };
    let c = rt.block_on(Committee::new(4, 1, offchain));
    for r in 0..requests {
        let request_id = format!("create-{r}");
        let secrets = (0..5)
            .map(|k| EncryptedSecret {
                id: Some(SecretIdentifier::new("bench", "main", format!("r{r}k{k}"))),
                encrypted_value: c.encrypt_hex(&[0xAB; 256]),
            })
            .collect();
        let request = VaultRequest::new(
            request_id.clone(),
            RequestPayload::CreateSecrets(CreateSecretsRequest {
                request_id,
                encrypted_secrets: secrets,
            }),
        );
        for oracle in &c.oracles {
            let _ = oracle.store.add(request.clone());
        }
    }
    c
}

fn bench_observation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("vault-observation");
    group.measurement_time(Duration::from_secs(5));

    for requests in [1usize, 10, 20] {
        let committee = committee_with_creates(&rt, requests);
        let oracle = &committee.oracles[0];
        group.bench_with_input(BenchmarkId::from_parameter(requests), &requests, |b, _| {
            b.iter(|| {
                black_box(
                    oracle
                        .plugin
                        .observation(&RoundContext::new(), &OutcomeContext { seq_nr: 1 }, &[], &oracle.kv)
                        .expect("observation"),
                )
            })
        });
    }
    group.finish();
}

fn bench_state_transition(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("vault-state-transition");
    group.measurement_time(Duration::from_secs(5));

    for requests in [1usize, 10, 20] {
        let committee = committee_with_creates(&rt, requests);
        let aos: Vec<AttributedObservation> = committee
            .oracles
            .iter()
            .map(|o| AttributedObservation {
                observation: o
                    .plugin
                    .observation(&RoundContext::new(), &OutcomeContext { seq_nr: 1 }, &[], &o.kv)
                    .expect("observation"),
                observer: o.index,
            })
            .collect();
        let plugin = &committee.oracles[0].plugin;

        group.bench_with_input(BenchmarkId::from_parameter(requests), &requests, |b, _| {
            b.iter(|| {
                let kv = InMemoryKeyValueStore::new();
                black_box(
                    plugin
                        .state_transition(&RoundContext::new(), &OutcomeContext { seq_nr: 1 }, &[], &aos, &kv)
                        .expect("state transition"),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_observation, bench_state_transition);
criterion_main!(benches);
