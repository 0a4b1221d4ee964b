//! # Policy Lifecycle Flows
//!
//! CreatePolicy, UpdatePolicy and RevokePolicy against a seeded ledger,
//! checking the device index after each committed invocation.

#[cfg(test)]
mod tests {
    use super::super::{bound_policies, open_policy, service_with_devices};
    use access_control::prelude::*;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use serde_json::Value;

    // =============================================================================
    // CREATE
    // =============================================================================

    #[tokio::test]
    async fn test_existing_devices_gain_policy_missing_are_skipped() {
        let mut rng = rand::thread_rng();
        let existing: Vec<String> = (0..rng.gen_range(1..8)).map(|i| format!("dev-{i}")).collect();
        let missing: Vec<String> = (0..rng.gen_range(0..8)).map(|i| format!("ghost-{i}")).collect();

        let existing_refs: Vec<&str> = existing.iter().map(String::as_str).collect();
        let service = service_with_devices(ServiceConfig::default(), &existing_refs);

        let mut scope: Vec<&str> = existing_refs
            .iter()
            .copied()
            .chain(missing.iter().map(String::as_str))
            .collect();
        scope.shuffle(&mut rng);

        let created = service.invoke(open_policy("P1", &scope)).await.unwrap();
        assert_eq!(
            created.payload,
            format!("Policy P1 successfully created and assigned to {} objects.", scope.len())
        );

        for id in &existing {
            assert_eq!(bound_policies(service.ledger(), id), Some(vec!["P1".to_string()]));
        }
        for id in &missing {
            assert!(service.ledger().get_committed(id).is_none(), "{id} must not be created");
        }

        // Re-adding is idempotent.
        service.invoke(open_policy("P1", &scope)).await.unwrap();
        for id in &existing {
            assert_eq!(bound_policies(service.ledger(), id), Some(vec!["P1".to_string()]));
        }
    }

    #[tokio::test]
    async fn test_binding_order_is_assignment_order() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        for id in ["P3", "P1", "P2"] {
            service.invoke(open_policy(id, &["D1"])).await.unwrap();
        }
        assert_eq!(
            bound_policies(service.ledger(), "D1"),
            Some(vec!["P3".to_string(), "P1".to_string(), "P2".to_string()])
        );
    }

    #[tokio::test]
    async fn test_corrupt_device_aborts_whole_invocation() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        service.ledger().seed("D2", b"{not json".to_vec());
        let version = service.ledger().version();

        let err = service.invoke(open_policy("P1", &["D1", "D2"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptRecord);

        // Neither the policy nor D1's binding was committed.
        assert_eq!(service.ledger().version(), version);
        assert!(service.ledger().get_committed("policy_P1").is_none());
        assert_eq!(bound_policies(service.ledger(), "D1"), None);
    }

    // =============================================================================
    // UPDATE
    // =============================================================================

    #[tokio::test]
    async fn test_update_touches_only_named_existing_fields() {
        let service = service_with_devices(ServiceConfig::default(), &[]);
        service.invoke(open_policy("P1", &[])).await.unwrap();
        let before: Value = serde_json::from_str(&service.read_policy("P1").await.unwrap()).unwrap();

        let update = PolicyUpdate::parse(r#"{"NotifyOnAccess":true,"Tier":"gold"}"#).unwrap();
        let message = service.update_policy("P1", update).await.unwrap();
        assert_eq!(message, "Policy P1 successfully updated.");

        let after: Value = serde_json::from_str(&service.read_policy("P1").await.unwrap()).unwrap();
        let before = before.as_object().unwrap();
        let after = after.as_object().unwrap();
        assert_eq!(before.len(), after.len());
        for (field, value) in after {
            if field == "NotifyOnAccess" {
                assert_eq!(value, &Value::Bool(true));
            } else {
                assert_eq!(Some(value), before.get(field), "{field} changed");
            }
        }
    }

    #[tokio::test]
    async fn test_update_rejects_type_mismatch() {
        let service = service_with_devices(ServiceConfig::default(), &[]);
        service.invoke(open_policy("P1", &[])).await.unwrap();
        let stored = service.ledger().get_committed("policy_P1");

        let err = service
            .invoke(Invocation::new("UpdatePolicy", ["P1", r#"{"MaxRequestsPerHour":"many"}"#]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert_eq!(service.ledger().get_committed("policy_P1"), stored);
    }

    // =============================================================================
    // REVOKE
    // =============================================================================

    #[tokio::test]
    async fn test_revoke_removes_everywhere_and_deletes() {
        let devices = ["D1", "D2", "D3"];
        let service = service_with_devices(ServiceConfig::default(), &devices);
        service.invoke(open_policy("KEEP", &["D2"])).await.unwrap();
        service.invoke(open_policy("P1", &["D1", "D2", "D3", "D4"])).await.unwrap();

        let message = service.revoke_policy("P1").await.unwrap();
        assert_eq!(message, "Policy P1 successfully revoked and removed.");

        for id in devices {
            let bound = bound_policies(service.ledger(), id).unwrap_or_default();
            assert!(!bound.contains(&"P1".to_string()), "{id} still bound");
        }
        assert_eq!(bound_policies(service.ledger(), "D2"), Some(vec!["KEEP".to_string()]));

        let err = service.read_policy("P1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_listing_tracks_lifecycle() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        for id in ["A", "B", "C"] {
            service.invoke(open_policy(id, &["D1"])).await.unwrap();
        }
        service.revoke_policy("B").await.unwrap();

        let listed: Vec<Value> =
            serde_json::from_str(&service.get_all_policies().await.unwrap()).unwrap();
        let ids: Vec<&str> = listed.iter().filter_map(|p| p["PolicyID"].as_str()).collect();
        assert_eq!(ids, ["A", "C"]);

        let stats = service.stats().await;
        assert_eq!(stats.committed, 4);
        assert_eq!(stats.read_only, 1);
    }

    #[tokio::test]
    async fn test_reindex_on_update_keeps_index_consistent() {
        let config = ServiceConfig {
            reindex_on_update: true,
            ..ServiceConfig::default()
        };
        let service = service_with_devices(config, &["D1", "D2", "D3"]);
        service.invoke(open_policy("P1", &["D1", "D2"])).await.unwrap();

        let update = PolicyUpdate::parse(r#"{"ObjectsList":["D3"]}"#).unwrap();
        service.update_policy("P1", update).await.unwrap();

        assert_eq!(bound_policies(service.ledger(), "D1"), Some(vec![]));
        assert_eq!(bound_policies(service.ledger(), "D2"), Some(vec![]));
        assert_eq!(bound_policies(service.ledger(), "D3"), Some(vec!["P1".to_string()]));

        // Revoking after a reindex leaves no stale bindings.
        service.revoke_policy("P1").await.unwrap();
        assert_eq!(bound_policies(service.ledger(), "D3"), Some(vec![]));
    }
}
