//! # Access Validation Flows
//!
//! ValidateAccessRequest through the service, from the reference scenario to
//! the boundary cases of each match rule.

#[cfg(test)]
mod tests {
    use super::super::{access, open_policy, policy_with, service_with_devices};
    use access_control::prelude::*;
    use serde_json::json;

    async fn granted(service: &AccessControlService<InMemoryLedger>, request: Invocation) -> String {
        service.invoke(request).await.unwrap().payload
    }

    async fn refused(
        service: &AccessControlService<InMemoryLedger>,
        request: Invocation,
    ) -> ContractError {
        service.invoke(request).await.unwrap_err()
    }

    #[tokio::test]
    async fn test_reference_scenario() {
        let service = create_test_service();
        service
            .ledger()
            .seed_device("D1", &json!({ "ID": "D1" }))
            .unwrap();

        let created = service
            .invoke(Invocation::new(
                "CreatePolicy",
                [
                    "P1",
                    r#"["D1"]"#,
                    "admin",
                    "09:00-17:00",
                    "",
                    "2030-01-01T00:00:00Z",
                    "100",
                    "true",
                    "",
                    "false",
                ],
            ))
            .await
            .unwrap();
        assert!(created.receipt.is_some());

        assert_eq!(
            granted(&service, access("D1", "admin", "2025-06-01T10:00:00Z")).await,
            "Access granted under policy P1"
        );
        let err = refused(&service, access("D1", "guest", "2025-06-01T10:00:00Z")).await;
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_second_policy_matches_when_first_fails_role() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        service
            .invoke(policy_with("P1", &["D1"], "admin", "", ""))
            .await
            .unwrap();
        service
            .invoke(policy_with("P2", &["D1"], "operator", "", ""))
            .await
            .unwrap();

        assert_eq!(
            granted(&service, access("D1", "operator", "2025-06-01T10:00:00Z")).await,
            "Access granted under policy P2"
        );
    }

    #[tokio::test]
    async fn test_access_hours_window_is_inclusive() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        service
            .invoke(policy_with("P1", &["D1"], "", "08:00-18:00", ""))
            .await
            .unwrap();

        for ts in ["2025-06-01T08:00:00Z", "2025-06-01T18:00:00Z"] {
            assert_eq!(
                granted(&service, access("D1", "any", ts)).await,
                "Access granted under policy P1"
            );
        }
        for ts in ["2025-06-01T07:59:00Z", "2025-06-01T18:01:00Z"] {
            let err = refused(&service, access("D1", "any", ts)).await;
            assert_eq!(err.kind(), ErrorKind::AccessDenied, "{ts}");
        }

        // Offsets are normalized to UTC before the window check.
        let err = refused(&service, access("D1", "any", "2025-06-01T09:00:00+02:00")).await;
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_expiration_instant_still_grants() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        service
            .invoke(policy_with("P1", &["D1"], "", "", "2030-01-01T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(
            granted(&service, access("D1", "any", "2030-01-01T00:00:00Z")).await,
            "Access granted under policy P1"
        );
        let err = refused(&service, access("D1", "any", "2030-01-01T00:00:01Z")).await;
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_unbound_and_unknown_devices() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);

        let err = refused(&service, access("D1", "any", "2025-06-01T10:00:00Z")).await;
        assert_eq!(err.kind(), ErrorKind::NoPoliciesAssociated);

        let err = refused(&service, access("D2", "any", "2025-06-01T10:00:00Z")).await;
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_revoked_policy_no_longer_grants() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        service.invoke(open_policy("P1", &["D1"])).await.unwrap();
        service.invoke(open_policy("P2", &["D1"])).await.unwrap();
        service.revoke_policy("P1").await.unwrap();

        assert_eq!(
            granted(&service, access("D1", "any", "2025-06-01T10:00:00Z")).await,
            "Access granted under policy P2"
        );
        service.revoke_policy("P2").await.unwrap();
        let err = refused(&service, access("D1", "any", "2025-06-01T10:00:00Z")).await;
        assert_eq!(err.kind(), ErrorKind::NoPoliciesAssociated);
    }

    #[tokio::test]
    async fn test_malformed_timestamp_rejected_up_front() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        let err = refused(&service, access("D1", "admin", "June 1st")).await;
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let stats = service.stats().await;
        assert_eq!(stats.rolled_back, 1);
        assert_eq!(stats.access_denied, 0);
    }

    #[tokio::test]
    async fn test_validation_leaves_ledger_untouched() {
        let service = service_with_devices(ServiceConfig::default(), &["D1"]);
        service.invoke(open_policy("P1", &["D1"])).await.unwrap();
        let version = service.ledger().version();

        for _ in 0..3 {
            let submission = service
                .invoke(access("D1", "any", "2025-06-01T10:00:00Z"))
                .await
                .unwrap();
            assert!(submission.receipt.is_none());
        }
        assert_eq!(service.ledger().version(), version);
        assert_eq!(service.stats().await.access_granted, 3);
    }
}
