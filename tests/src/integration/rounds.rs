//! # Request Lifecycle
//!
//! Requests enter through intake at every oracle, are agreed on in a round,
//! and come back to the waiting caller as signed reports.

#[cfg(test)]
mod tests {
    use crate::harness::Committee;
    use prost::Message;
    use vault_crypto::RecipientKeyPair;
    use vault_plugin::domain::{PluginError, VaultRequest};
    use vault_types::{
        validate_signatures, CreateSecretsRequest, DeleteSecretsRequest, EncryptedSecret,
        GetSecretsRequest, GetSecretsResponse, ListSecretIdentifiersRequest, Observations,
        RequestPayload, ResponsePayload, SecretIdentifier, SecretRequest, TypesError,
        UpdateSecretsRequest, VaultResponse,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn id(key: &str) -> SecretIdentifier {
        SecretIdentifier::new("alice", "main", key)
    }

    fn create(c: &Committee, request_id: &str, items: &[(&str, &[u8])]) -> VaultRequest {
        VaultRequest::new(
            request_id,
            RequestPayload::CreateSecrets(CreateSecretsRequest {
                request_id: request_id.to_string(),
                encrypted_secrets: items
                    .iter()
                    .map(|(key, plaintext)| EncryptedSecret {
                        id: Some(id(key)),
                        encrypted_value: c.encrypt_hex(plaintext),
                    })
                    .collect(),
            }),
        )
    }

    fn get(request_id: &str, key: &str, encryption_keys: Vec<String>) -> VaultRequest {
        VaultRequest::new(
            request_id,
            RequestPayload::GetSecrets(GetSecretsRequest {
                requests: vec![SecretRequest {
                    id: Some(id(key)),
                    encryption_keys,
                }],
            }),
        )
    }

    fn list(request_id: &str) -> VaultRequest {
        VaultRequest::new(
            request_id,
            RequestPayload::ListSecretIdentifiers(ListSecretIdentifiersRequest {
                request_id: request_id.to_string(),
                owner: "alice".to_string(),
                namespace: "main".to_string(),
            }),
        )
    }

    async fn first_response(
        receivers: Vec<tokio::sync::oneshot::Receiver<VaultResponse>>,
    ) -> Vec<VaultResponse> {
        let mut out = Vec::with_capacity(receivers.len());
        for rx in receivers {
            out.push(rx.await.unwrap());
        }
        out
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_create_reaches_every_caller_with_valid_signatures() {
        let c = Committee::standard().await;
        let receivers = c.submit(create(&c, "create-1", &[("api_key", b"hunter2")])).unwrap();

        let round = c.run_round().await;
        assert_eq!(round.reports.len(), 1);

        let responses = first_response(receivers).await;
        assert_eq!(responses.len(), 4);
        for response in &responses {
            assert_eq!(response.id, "create-1");
            assert!(!response.is_error());
            assert_eq!(response.format, "REPORT_FORMAT_JSON");
            assert_eq!(
                String::from_utf8(response.payload.clone()).unwrap(),
                r#"{"responses":[{"id":{"key":"api_key","namespace":"main","owner":"alice"},"success":true}]}"#
            );

            let signed = response.to_signed_response();
            validate_signatures(&signed, &c.signer_addresses(), c.f + 1).unwrap();
        }

        for oracle in &c.oracles {
            assert_eq!(oracle.store.pending_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_get_shares_combine_to_plaintext() {
        let c = Committee::standard().await;
        c.submit(create(&c, "create-1", &[("db_password", b"correct horse")]))
            .unwrap();
        c.run_round().await;

        let client = RecipientKeyPair::generate();
        let receivers = c
            .submit(get("get-1", "db_password", vec![client.public_key_hex()]))
            .unwrap();
        c.run_round().await;

        let responses = first_response(receivers).await;
        let response = &responses[0];
        assert_eq!(response.format, "REPORT_FORMAT_PROTOBUF");

        let decoded = GetSecretsResponse::decode(response.payload.as_slice()).unwrap();
        let data = decoded.responses[0].data().unwrap();
        let ciphertext = hex::decode(&data.encrypted_value).unwrap();
        assert_eq!(data.encrypted_value, c.encrypt_hex(b"correct horse"));

        let bundle = &data.encrypted_decryption_key_shares[0];
        assert_eq!(bundle.encryption_key, client.public_key_hex());
        // Every honest oracle agreed, so every oracle's share is present.
        assert_eq!(bundle.shares.len(), c.n);

        let opened: Vec<Vec<u8>> = bundle
            .shares
            .iter()
            .map(|s| client.open(&hex::decode(s).unwrap()).unwrap())
            .collect();
        let plaintext = c.scheme.combine(&ciphertext, &opened, c.f + 1).unwrap();
        assert_eq!(plaintext, b"correct horse");
    }

    #[tokio::test]
    async fn test_update_delete_list_lifecycle() {
        let c = Committee::standard().await;
        c.submit(create(&c, "create-1", &[("a", b"1"), ("b", b"2")])).unwrap();
        c.run_round().await;

        c.submit(VaultRequest::new(
            "update-1",
            RequestPayload::UpdateSecrets(UpdateSecretsRequest {
                request_id: "update-1".to_string(),
                encrypted_secrets: vec![EncryptedSecret {
                    id: Some(id("a")),
                    encrypted_value: c.encrypt_hex(b"3"),
                }],
            }),
        ))
        .unwrap();
        c.run_round().await;

        c.submit(VaultRequest::new(
            "delete-1",
            RequestPayload::DeleteSecrets(DeleteSecretsRequest {
                request_id: "delete-1".to_string(),
                ids: vec![id("b")],
            }),
        ))
        .unwrap();
        let round = c.run_round().await;
        let Some(ResponsePayload::DeleteSecrets(resp)) = &round.leader_outcomes()[0].response
        else {
            panic!("expected delete outcome");
        };
        assert!(resp.responses[0].success);

        c.submit(list("list-1")).unwrap();
        let round = c.run_round().await;
        let Some(ResponsePayload::ListSecretIdentifiers(resp)) =
            &round.leader_outcomes()[0].response
        else {
            panic!("expected list outcome");
        };
        assert_eq!(resp.identifiers, vec![id("a")]);

        c.submit(get("get-1", "a", vec![])).unwrap();
        let round = c.run_round().await;
        let Some(ResponsePayload::GetSecrets(resp)) = &round.leader_outcomes()[0].response else {
            panic!("expected get outcome");
        };
        assert_eq!(resp.responses[0].data().unwrap().encrypted_value, c.encrypt_hex(b"3"));
    }

    #[tokio::test]
    async fn test_replicas_stay_identical() {
        let c = Committee::standard().await;
        c.submit(create(&c, "create-1", &[("a", b"1"), ("b", b"2")])).unwrap();
        c.submit(list("list-1")).unwrap();
        let round = c.run_round().await;

        for outcomes in &round.outcomes[1..] {
            assert_eq!(outcomes, &round.outcomes[0]);
        }
        let snapshot = c.oracles[0].kv.snapshot();
        assert!(!snapshot.is_empty());
        for oracle in &c.oracles[1..] {
            assert_eq!(oracle.kv.snapshot(), snapshot);
        }
    }

    // =============================================================================
    // FAULTS
    // =============================================================================

    #[tokio::test]
    async fn test_quorum_miss_keeps_request_pending() {
        let c = Committee::standard().await;
        let mut receivers = c.submit(create(&c, "create-1", &[("a", b"1")])).unwrap();

        let round = c.run_round_with(&[0, 1], |_, bytes| bytes).await;
        assert!(round.reports.is_empty());
        assert!(c.oracles[0].kv.is_empty());
        assert!(c.oracles.iter().all(|o| o.store.is_pending("create-1")));
        assert!(receivers[0].try_recv().is_err());

        let round = c.run_round().await;
        assert_eq!(round.reports.len(), 1);
        let responses = first_response(receivers).await;
        assert!(responses.iter().all(|r| !r.is_error()));
    }

    #[tokio::test]
    async fn test_byzantine_minority_is_outvoted() {
        let c = Committee::standard().await;
        c.submit(create(&c, "create-1", &[("a", b"1")])).unwrap();

        let round = c
            .run_round_with(&[0, 1, 2, 3], |i, bytes| {
                if i != 3 {
                    return bytes;
                }
                let mut obs = Observations::decode(bytes.as_slice()).unwrap();
                if let Some(ResponsePayload::CreateSecrets(resp)) = &mut obs.observations[0].response
                {
                    resp.responses[0].error = "key does not exist".to_string();
                }
                obs.encode_to_vec()
            })
            .await;

        let Some(ResponsePayload::CreateSecrets(resp)) = &round.leader_outcomes()[0].response
        else {
            panic!("expected create outcome");
        };
        assert!(resp.responses[0].success);
    }

    #[tokio::test]
    async fn test_garbage_observation_is_excluded() {
        let c = Committee::standard().await;
        c.submit(list("list-1")).unwrap();

        let round = c
            .run_round_with(&[0, 1, 2, 3], |i, bytes| {
                if i == 2 {
                    vec![0xff, 0xff, 0xff]
                } else {
                    bytes
                }
            })
            .await;
        assert_eq!(round.leader_outcomes().len(), 1);
    }

    #[tokio::test]
    async fn test_too_few_signers_rejected() {
        let c = Committee::standard().await;
        let receivers = c.submit(list("list-1")).unwrap();
        c.run_round().await;

        let responses = first_response(receivers).await;
        let signed = responses[0].to_signed_response();
        assert!(matches!(
            validate_signatures(&signed, &c.signer_addresses(), c.n),
            Err(TypesError::NotEnoughSignatures { .. })
        ));
        assert!(matches!(
            validate_signatures(&signed, &c.signer_addresses()[2..], c.f + 1),
            Err(TypesError::InsufficientValidSigners { .. })
        ));
    }

    // =============================================================================
    // INTAKE
    // =============================================================================

    #[tokio::test]
    async fn test_intake_rejects_before_any_round() {
        let c = Committee::standard().await;
        let request = create(&c, "create-dup", &[("a", b"1"), ("a", b"2")]);
        let err = c.submit(request).unwrap_err();
        assert!(matches!(err, PluginError::InvalidRequest(_)));
        assert!(err.to_string().starts_with("duplicate secret ID found at index 1"));
        assert!(c.oracles.iter().all(|o| o.store.pending_count() == 0));

        let foreign = vault_crypto::testing::TestScheme::new(1, 4);
        let request = VaultRequest::new(
            "create-foreign",
            RequestPayload::CreateSecrets(CreateSecretsRequest {
                request_id: "create-foreign".to_string(),
                encrypted_secrets: vec![EncryptedSecret {
                    id: Some(id("a")),
                    encrypted_value: hex::encode(foreign.encrypt(b"x")),
                }],
            }),
        );
        assert!(c
            .submit(request)
            .unwrap_err()
            .to_string()
            .starts_with("failed to verify encrypted value at index 0"));
    }

    #[tokio::test]
    async fn test_public_key_published_after_construction() {
        let c = Committee::standard().await;
        let expected = hex::encode(
            vault_crypto::ThresholdPublicKey::marshal(c.scheme.public_key().as_ref()).unwrap(),
        );
        for oracle in &c.oracles {
            assert_eq!(oracle.intake.public_key_hex().unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_duplicate_request_id_rejected() {
        let c = Committee::standard().await;
        c.submit(list("list-1")).unwrap();
        assert!(matches!(
            c.submit(list("list-1")),
            Err(PluginError::DuplicateRequest(_))
        ));
    }
}
