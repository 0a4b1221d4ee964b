//! # Concurrency Flows
//!
//! Concurrent invocations touching the same device are reconciled by the
//! ledger's optimistic concurrency control: the loser of a race is rejected
//! as a whole and may be resubmitted against a fresh snapshot.

#[cfg(test)]
mod tests {
    use super::super::{bound_policies, init_test_tracing, open_policy};
    use access_control::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn shared_ledger(devices: &[&str]) -> Arc<InMemoryLedger> {
        init_test_tracing();
        let ledger = InMemoryLedger::new();
        for id in devices {
            ledger.seed_device(id, &json!({ "ID": id })).unwrap();
        }
        Arc::new(ledger)
    }

    #[tokio::test]
    async fn test_stale_device_write_conflicts() {
        let ledger = shared_ledger(&["D1"]);
        let contract = AccessControlContract::new(ServiceConfig::default());

        let mut first = ledger.begin().await.unwrap();
        let mut second = ledger.begin().await.unwrap();

        let op = |id: &str| open_policy(id, &["D1"]).into_operation().unwrap();
        contract.execute(&mut first, op("P1")).await.unwrap();
        contract.execute(&mut second, op("P2")).await.unwrap();

        ledger.commit(first).await.unwrap();
        let err = ContractError::from(ledger.commit(second).await.unwrap_err());
        assert!(err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::Ledger);

        // The losing invocation left nothing behind, its policy record included.
        assert_eq!(bound_policies(&ledger, "D1"), Some(vec!["P1".to_string()]));
        assert!(ledger.get_committed("policy_P2").is_none());
    }

    #[tokio::test]
    async fn test_retry_after_conflict_succeeds() {
        let ledger = shared_ledger(&["D1"]);
        let service = AccessControlService::from_shared(Arc::clone(&ledger), ServiceConfig::default());
        let contract = AccessControlContract::new(ServiceConfig::default());

        // A competing writer commits between this transaction's read and commit.
        let mut stale = ledger.begin().await.unwrap();
        contract
            .execute(&mut stale, open_policy("P2", &["D1"]).into_operation().unwrap())
            .await
            .unwrap();
        service.invoke(open_policy("P1", &["D1"])).await.unwrap();
        assert!(ledger.commit(stale).await.is_err());

        let op = open_policy("P2", &["D1"]).into_operation().unwrap();
        service.submit_with_retry(op, 3).await.unwrap();
        assert_eq!(
            bound_policies(&ledger, "D1"),
            Some(vec!["P1".to_string(), "P2".to_string()])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_creates_on_one_device_all_land() {
        let ledger = shared_ledger(&["D1"]);
        let service = Arc::new(AccessControlService::from_shared(
            Arc::clone(&ledger),
            ServiceConfig::default(),
        ));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let op = open_policy(&format!("P{i}"), &["D1"]).into_operation().unwrap();
                    service.submit_with_retry(op, 64).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut bound = bound_policies(&ledger, "D1").unwrap();
        bound.sort();
        let mut expected: Vec<String> = (0..16).map(|i| format!("P{i}")).collect();
        expected.sort();
        assert_eq!(bound, expected);

        let stats = service.stats().await;
        assert_eq!(stats.committed, 16);
        assert_eq!(stats.invocations, 16 + stats.conflicts);
    }
}
