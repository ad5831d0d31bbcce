//! # Round Properties
//!
//! Store consistency, quorum thresholds and aggregation determinism,
//! checked against whole committees.

#[cfg(test)]
mod tests {
    use crate::harness::Committee;
    use prost::Message;
    use vault_crypto::RecipientKeyPair;
    use vault_plugin::adapters::{InMemoryKeyValueStore, VaultStore};
    use vault_plugin::domain::{
        validate_identifier, AttributedObservation, IdentifierLimits, OutcomeContext,
        RoundContext, VaultRequest,
    };
    use vault_plugin::ports::{KeyValueReadWriter, ReportingPlugin};
    use vault_types::{
        CreateSecretsRequest, DeleteSecretsRequest, EncryptedSecret, GetSecretsRequest,
        ListSecretIdentifiersRequest, Observations, Outcome, Outcomes, ReportingPluginConfig, RequestPayload, ResponsePayload,
        SecretIdentifier, SecretRequest, StoredSecret,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn create_request(c: &Committee, request_id: &str, ids: &[SecretIdentifier]) -> VaultRequest {
        VaultRequest::new(
            request_id,
            RequestPayload::CreateSecrets(CreateSecretsRequest {
                request_id: request_id.to_string(),
                encrypted_secrets: ids
                    .iter()
                    .map(|id| EncryptedSecret {
                        id: Some(id.clone()),
                        encrypted_value: c.encrypt_hex(id.key.as_bytes()),
                    })
                    .collect(),
            }),
        )
    }

    fn get_request(request_id: &str, id: SecretIdentifier) -> VaultRequest {
        VaultRequest::new(
            request_id,
            RequestPayload::GetSecrets(GetSecretsRequest {
                requests: vec![SecretRequest {
                    id: Some(id),
                    encryption_keys: vec![],
                }],
            }),
        )
    }

    fn list_request(request_id: &str, owner: &str, namespace: &str) -> VaultRequest {
        VaultRequest::new(
            request_id,
            RequestPayload::ListSecretIdentifiers(ListSecretIdentifiersRequest {
                request_id: request_id.to_string(),
                owner: owner.to_string(),
                namespace: namespace.to_string(),
            }),
        )
    }

    /// Queue `request` at every oracle without intake checks.
    fn enqueue_raw(c: &Committee, request: VaultRequest) {
        for oracle in &c.oracles {
            oracle.store.add(request.clone()).unwrap();
        }
    }

    fn observations_from(c: &Committee, oracles: &[usize]) -> Vec<AttributedObservation> {
        oracles
            .iter()
            .map(|&i| AttributedObservation {
                observation: c.oracles[i]
                    .plugin
                    .observation(
                        &RoundContext::new(),
                        &OutcomeContext { seq_nr: 1 },
                        &[],
                        &c.oracles[i].kv,
                    )
                    .unwrap(),
                observer: i as u8,
            })
            .collect()
    }

    fn transition(
        c: &Committee,
        aos: &[AttributedObservation],
        kv: &InMemoryKeyValueStore,
    ) -> Vec<u8> {
        c.oracles[0]
            .plugin
            .state_transition(&RoundContext::new(), &OutcomeContext { seq_nr: 1 }, &[], aos, kv)
            .unwrap()
    }

    /// Fresh store holding a copy of every entry in `kv`.
    fn replica_of(kv: &InMemoryKeyValueStore) -> InMemoryKeyValueStore {
        let replica = InMemoryKeyValueStore::new();
        for (key, value) in kv.snapshot() {
            replica.write(&key, &value).unwrap();
        }
        replica
    }

    fn sorted_outcomes(bytes: &[u8]) -> Vec<Outcome> {
        let mut outcomes = Outcomes::decode(bytes).unwrap().outcomes;
        outcomes.sort_by(|a, b| a.id.cmp(&b.id));
        outcomes
    }

    // =============================================================================
    // IDENTIFIERS AND STORE
    // =============================================================================

    #[test]
    fn test_identifier_normalization_idempotent() {
        let limits = IdentifierLimits::default();
        let raw = SecretIdentifier::new("alice", "", "token");

        let once = validate_identifier(Some(&raw), &limits).unwrap();
        let twice = validate_identifier(Some(&once), &limits).unwrap();
        assert_eq!(once, SecretIdentifier::new("alice", "main", "token"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_store_roundtrip_tracks_live_identifiers() {
        let kv = InMemoryKeyValueStore::new();
        let store = VaultStore::new(&kv);
        let ids: Vec<SecretIdentifier> = (0..5)
            .map(|i| SecretIdentifier::new("alice", "main", format!("k{i}")))
            .collect();

        for (i, id) in ids.iter().enumerate() {
            let secret = StoredSecret {
                encrypted_secret: vec![i as u8; 4],
            };
            store.write_secret(id, &secret).unwrap();
            assert_eq!(store.get_secret(id).unwrap(), Some(secret));
        }
        assert_eq!(store.get_secret_identifiers_count_for_owner("alice").unwrap(), 5);

        store.delete_secret(&ids[1]).unwrap();
        store.delete_secret(&ids[3]).unwrap();
        assert_eq!(store.get_secret(&ids[1]).unwrap(), None);
        assert_eq!(store.get_secret_identifiers_count_for_owner("alice").unwrap(), 3);

        store
            .write_secret(&ids[1], &StoredSecret { encrypted_secret: vec![9] })
            .unwrap();
        assert_eq!(store.get_secret_identifiers_count_for_owner("alice").unwrap(), 4);
        assert_eq!(store.get_secret_identifiers_count_for_owner("bob").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_orphaned_value_after_crash_is_recreatable() {
        let c = Committee::standard().await;
        let id = SecretIdentifier::new("alice", "main", "orphan");

        for oracle in &c.oracles {
            let store = VaultStore::new(&oracle.kv);
            store
                .write_secret(&id, &StoredSecret { encrypted_secret: vec![1, 2, 3] })
                .unwrap();
            oracle.kv.delete(b"Metadata::alice").unwrap();
        }

        c.submit(get_request("get-1", id.clone())).unwrap();
        let round = c.run_round().await;
        let Some(ResponsePayload::GetSecrets(resp)) = &round.leader_outcomes()[0].response else {
            panic!("expected get outcome");
        };
        assert_eq!(resp.responses[0].error_message(), Some("key does not exist"));

        c.submit(create_request(&c, "create-1", &[id.clone()])).unwrap();
        let round = c.run_round().await;
        let Some(ResponsePayload::CreateSecrets(resp)) = &round.leader_outcomes()[0].response
        else {
            panic!("expected create outcome");
        };
        assert!(resp.responses[0].success, "{}", resp.responses[0].error);
    }

    // =============================================================================
    // QUORUM AND DETERMINISM
    // =============================================================================

    #[tokio::test]
    async fn test_quorum_threshold_n4_f1() {
        let c = Committee::standard().await;
        enqueue_raw(&c, list_request("list-1", "alice", "main"));

        let one = observations_from(&c, &[0]);
        let outcomes = Outcomes::decode(transition(&c, &one, &InMemoryKeyValueStore::new()).as_slice())
            .unwrap();
        assert!(outcomes.outcomes.is_empty());

        let three = observations_from(&c, &[0, 1, 2]);
        let outcomes =
            Outcomes::decode(transition(&c, &three, &InMemoryKeyValueStore::new()).as_slice())
                .unwrap();
        assert_eq!(outcomes.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_aggregation_ignores_arrival_order() {
        let c = Committee::standard().await;
        let ids = [
            SecretIdentifier::new("alice", "main", "b"),
            SecretIdentifier::new("alice", "main", "a"),
            SecretIdentifier::new("alice", "ops", "c"),
        ];
        enqueue_raw(&c, create_request(&c, "create-1", &ids));

        let forward = observations_from(&c, &[0, 1, 2, 3]);
        let mut backward = forward.clone();
        backward.reverse();

        let kv_a = InMemoryKeyValueStore::new();
        let kv_b = InMemoryKeyValueStore::new();
        assert_eq!(transition(&c, &forward, &kv_a), transition(&c, &backward, &kv_b));
        assert_eq!(kv_a.snapshot(), kv_b.snapshot());
    }

    #[tokio::test]
    async fn test_get_aggregation_ignores_arrival_order() {
        let c = Committee::standard().await;
        let id = SecretIdentifier::new("alice", "main", "token");
        c.submit(create_request(&c, "create-1", &[id.clone()])).unwrap();
        c.run_round().await;

        let client = RecipientKeyPair::generate();
        enqueue_raw(
            &c,
            VaultRequest::new(
                "get-1",
                RequestPayload::GetSecrets(GetSecretsRequest {
                    requests: vec![SecretRequest {
                        id: Some(id),
                        encryption_keys: vec![client.public_key_hex()],
                    }],
                }),
            ),
        );

        let forward = observations_from(&c, &[0, 1, 2, 3]);
        let mut backward = forward.clone();
        backward.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(1);

        let kv = &c.oracles[0].kv;
        let expected = transition(&c, &forward, kv);
        assert_eq!(transition(&c, &backward, kv), expected);
        assert_eq!(transition(&c, &rotated, kv), expected);

        let outcomes = Outcomes::decode(expected.as_slice()).unwrap();
        let Some(ResponsePayload::GetSecrets(resp)) = &outcomes.outcomes[0].response else {
            panic!("expected get outcome");
        };
        let bundle = &resp.responses[0].data().unwrap().encrypted_decryption_key_shares[0];
        assert_eq!(bundle.encryption_key, client.public_key_hex());
        assert_eq!(bundle.shares.len(), c.n);
    }

    #[tokio::test]
    async fn test_delete_and_list_aggregation_ignore_arrival_order() {
        let c = Committee::standard().await;
        let ids = [
            SecretIdentifier::new("alice", "main", "a"),
            SecretIdentifier::new("alice", "main", "b"),
        ];
        c.submit(create_request(&c, "create-1", &ids)).unwrap();
        c.run_round().await;

        enqueue_raw(
            &c,
            VaultRequest::new(
                "delete-1",
                RequestPayload::DeleteSecrets(DeleteSecretsRequest {
                    request_id: "delete-1".to_string(),
                    ids: vec![ids[0].clone()],
                }),
            ),
        );
        enqueue_raw(&c, list_request("list-1", "alice", "main"));

        let forward = observations_from(&c, &[0, 1, 2, 3]);
        let mut backward = forward.clone();
        backward.reverse();

        let kv_a = replica_of(&c.oracles[0].kv);
        let kv_b = replica_of(&c.oracles[0].kv);
        let a = sorted_outcomes(&transition(&c, &forward, &kv_a));
        let b = sorted_outcomes(&transition(&c, &backward, &kv_b));

        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
        assert_eq!(kv_a.snapshot(), kv_b.snapshot());
    }

    // =============================================================================
    // WRITE RULES
    // =============================================================================

    #[tokio::test]
    async fn test_create_then_read() {
        let c = Committee::standard().await;
        let id = SecretIdentifier::new("o", "main", "k");

        c.submit(create_request(&c, "create-1", &[id.clone()])).unwrap();
        c.run_round().await;

        c.submit(get_request("get-1", id.clone())).unwrap();
        let round = c.run_round().await;
        let Some(ResponsePayload::GetSecrets(resp)) = &round.leader_outcomes()[0].response else {
            panic!("expected get outcome");
        };
        assert_eq!(resp.responses[0].error_message(), None);
        assert_eq!(
            resp.responses[0].data().unwrap().encrypted_value,
            c.encrypt_hex(b"k")
        );
    }

    #[tokio::test]
    async fn test_duplicate_in_batch_fails_every_copy() {
        let c = Committee::standard().await;
        let id = SecretIdentifier::new("alice", "main", "dup");
        enqueue_raw(&c, create_request(&c, "create-dup", &[id.clone(), id.clone()]));

        let aos = observations_from(&c, &[0]);
        let obs = Observations::decode(aos[0].observation.as_slice()).unwrap();
        let Some(ResponsePayload::CreateSecrets(resp)) = &obs.observations[0].response else {
            panic!("expected create observation");
        };
        assert_eq!(resp.responses.len(), 2);
        for r in &resp.responses {
            assert_eq!(r.error, "duplicate request for secret identifier alice::main::dup");
        }

        // Peers refuse to count such an observation.
        assert!(c.oracles[1]
            .plugin
            .validate_observation(&RoundContext::new(), &OutcomeContext::default(), &[], &aos[0])
            .is_err());
    }

    #[tokio::test]
    async fn test_owner_cap_enforced_at_state_transition() {
        let offchain = ReportingPluginConfig {
            max_secrets_per_owner: 1,
            ..Default::default()
        };
        let c = Committee::new(4, 1, offchain).await;

        c.submit(create_request(&c, "create-1", &[SecretIdentifier::new("alice", "main", "a")]))
            .unwrap();
        c.run_round().await;

        c.submit(create_request(&c, "create-2", &[SecretIdentifier::new("alice", "main", "b")]))
            .unwrap();
        let aos = observations_from(&c, &[0]);
        let obs = Observations::decode(aos[0].observation.as_slice()).unwrap();
        let Some(ResponsePayload::CreateSecrets(observed)) = &obs.observations[0].response else {
            panic!("expected create observation");
        };
        assert!(observed.responses[0].error.is_empty());

        let round = c.run_round().await;
        let Some(ResponsePayload::CreateSecrets(resp)) = &round.leader_outcomes()[0].response
        else {
            panic!("expected create outcome");
        };
        assert!(!resp.responses[0].success);
        assert!(resp.responses[0]
            .error
            .contains("has reached maximum number of secrets (1)"));
    }

    // =============================================================================
    // LISTING
    // =============================================================================

    #[tokio::test]
    async fn test_list_sorted_and_filtered() {
        let c = Committee::standard().await;
        c.submit(create_request(
            &c,
            "create-1",
            &[
                SecretIdentifier::new("alice", "main", "b"),
                SecretIdentifier::new("alice", "ops", "a"),
                SecretIdentifier::new("alice", "main", "a"),
            ],
        ))
        .unwrap();
        c.run_round().await;

        enqueue_raw(&c, list_request("list-all", "alice", ""));
        c.submit(list_request("list-main", "alice", "main")).unwrap();
        enqueue_raw(&c, list_request("list-nobody", "bob", ""));
        let round = c.run_round().await;

        let listed: Vec<(String, Vec<SecretIdentifier>, bool)> = round
            .leader_outcomes()
            .iter()
            .map(|o| match &o.response {
                Some(ResponsePayload::ListSecretIdentifiers(r)) => {
                    (o.id.clone(), r.identifiers.clone(), r.success)
                }
                _ => panic!("expected list outcome"),
            })
            .collect();

        assert_eq!(
            listed,
            vec![
                (
                    "list-all".to_string(),
                    vec![
                        SecretIdentifier::new("alice", "main", "a"),
                        SecretIdentifier::new("alice", "main", "b"),
                        SecretIdentifier::new("alice", "ops", "a"),
                    ],
                    true,
                ),
                (
                    "list-main".to_string(),
                    vec![
                        SecretIdentifier::new("alice", "main", "a"),
                        SecretIdentifier::new("alice", "main", "b"),
                    ],
                    true,
                ),
                ("list-nobody".to_string(), vec![], true),
            ]
        );
    }
}
