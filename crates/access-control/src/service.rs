//! # Access-Control Service
//!
//! Runs each contract operation as one ledger transaction.
//!
//! ## Invocation Lifecycle
//!
//! 1. `begin` a transaction against the current committed state
//! 2. Execute the operation with the transaction as its explicit context
//! 3. Mutating operation succeeded: `commit` (may fail on MVCC conflict)
//! 4. Read-only operation or any failure: `rollback`, nothing is written
//!
//! Every invocation is traced under its transaction id.

use crate::adapters::memory_ledger::InMemoryLedger;
use crate::config::ServiceConfig;
use crate::contract::{AccessControlContract, Operation};
use crate::domain::entities::Policy;
use crate::domain::matching::AccessRequest;
use crate::domain::updates::PolicyUpdate;
use crate::errors::ContractError;
use crate::invocation::Invocation;
use crate::ports::inbound::AccessControlApi;
use crate::ports::outbound::{CommitReceipt, Ledger, TransactionContext};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, field, info, instrument, warn, Span};

/// Statistics for the Access-Control Service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Operations submitted.
    pub invocations: u64,
    /// Mutating operations committed.
    pub committed: u64,
    /// Operations whose writes were discarded after a failure.
    pub rolled_back: u64,
    /// Read-only operations completed.
    pub read_only: u64,
    /// Access requests granted.
    pub access_granted: u64,
    /// Access requests denied.
    pub access_denied: u64,
    /// Commits rejected by optimistic concurrency control.
    pub conflicts: u64,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Text payload returned by the operation.
    pub payload: String,
    /// Commit details; `None` for read-only operations.
    pub receipt: Option<CommitReceipt>,
}

/// The main Access-Control Service.
pub struct AccessControlService<L: Ledger> {
    /// Operation executor.
    contract: AccessControlContract,
    /// Host ledger.
    ledger: Arc<L>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<L: Ledger> AccessControlService<L> {
    /// Create a new service over `ledger`.
    pub fn new(ledger: L, config: ServiceConfig) -> Self {
        Self::with_contract(Arc::new(ledger), AccessControlContract::new(config))
    }

    /// Create a service over a ledger shared with other services.
    pub fn from_shared(ledger: Arc<L>, config: ServiceConfig) -> Self {
        Self::with_contract(ledger, AccessControlContract::new(config))
    }

    /// Create a service around a preconfigured contract.
    pub fn with_contract(ledger: Arc<L>, contract: AccessControlContract) -> Self {
        Self {
            contract,
            ledger,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Underlying ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        self.contract.config()
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Parses and submits a named function call.
    pub async fn invoke(&self, invocation: Invocation) -> Result<Submission, ContractError> {
        let op = match invocation.into_operation() {
            Ok(op) => op,
            Err(e) => {
                let mut stats = self.stats.write().await;
                stats.invocations += 1;
                stats.rolled_back += 1;
                drop(stats);
                warn!(error = %e, "Rejected malformed invocation");
                return Err(e);
            }
        };
        self.submit(op).await
    }

    /// Runs `op` in its own transaction.
    #[instrument(skip_all, fields(operation = op.name(), tx_id = field::Empty))]
    pub async fn submit(&self, op: Operation) -> Result<Submission, ContractError> {
        self.stats.write().await.invocations += 1;

        let read_only = op.is_read_only();
        let is_validation = matches!(op, Operation::ValidateAccessRequest(_));

        let mut tx = self.ledger.begin().await?;
        Span::current().record("tx_id", field::display(tx.tx_id()));

        let result = self.contract.execute(&mut tx, op).await;

        match result {
            Ok(payload) if read_only => {
                self.discard(tx).await;
                let mut stats = self.stats.write().await;
                stats.read_only += 1;
                if is_validation {
                    stats.access_granted += 1;
                }
                drop(stats);
                debug!(payload = %payload, "Read-only operation completed");
                Ok(Submission {
                    payload,
                    receipt: None,
                })
            }
            Ok(payload) => match self.ledger.commit(tx).await {
                Ok(receipt) => {
                    self.stats.write().await.committed += 1;
                    info!(
                        version = receipt.version,
                        writes = receipt.writes,
                        deletes = receipt.deletes,
                        digest = %receipt.write_set_digest,
                        "{}",
                        payload
                    );
                    Ok(Submission {
                        payload,
                        receipt: Some(receipt),
                    })
                }
                Err(e) => {
                    let err = ContractError::from(e);
                    let mut stats = self.stats.write().await;
                    stats.rolled_back += 1;
                    if err.is_retryable() {
                        stats.conflicts += 1;
                    }
                    drop(stats);
                    warn!(error = %err, "Commit rejected, writes discarded");
                    Err(err)
                }
            },
            Err(err) => {
                self.discard(tx).await;
                let mut stats = self.stats.write().await;
                stats.rolled_back += 1;
                if matches!(err, ContractError::AccessDenied { .. }) {
                    stats.access_denied += 1;
                }
                drop(stats);
                warn!(error = %err, "Operation failed, writes discarded");
                Err(err)
            }
        }
    }

    /// Submits `op`, resubmitting it against a fresh snapshot after an MVCC
    /// conflict, up to `max_attempts` tries in total.
    pub async fn submit_with_retry(
        &self,
        op: Operation,
        max_attempts: u32,
    ) -> Result<Submission, ContractError> {
        let mut attempt = 1;
        loop {
            match self.submit(op.clone()).await {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    debug!(attempt, error = %e, "Retrying after conflict");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn discard(&self, tx: L::Transaction) {
        if let Err(e) = self.ledger.rollback(tx).await {
            warn!(error = %e, "Rollback failed");
        }
    }
}

/// Create a default service with an in-memory ledger (for testing).
#[must_use]
pub fn create_test_service() -> AccessControlService<InMemoryLedger> {
    AccessControlService::new(InMemoryLedger::new(), ServiceConfig::default())
}

// =============================================================================
// AccessControlApi Implementation
// =============================================================================

#[async_trait]
impl<L: Ledger> AccessControlApi for AccessControlService<L> {
    async fn create_policy(&self, policy: Policy) -> Result<String, ContractError> {
        Ok(self.submit(Operation::CreatePolicy(policy)).await?.payload)
    }

    async fn read_policy(&self, policy_id: &str) -> Result<String, ContractError> {
        let op = Operation::ReadPolicy {
            policy_id: policy_id.to_string(),
        };
        Ok(self.submit(op).await?.payload)
    }

    async fn get_all_policies(&self) -> Result<String, ContractError> {
        Ok(self.submit(Operation::GetAllPolicies).await?.payload)
    }

    async fn update_policy(
        &self,
        policy_id: &str,
        update: PolicyUpdate,
    ) -> Result<String, ContractError> {
        let op = Operation::UpdatePolicy {
            policy_id: policy_id.to_string(),
            update,
        };
        Ok(self.submit(op).await?.payload)
    }

    async fn revoke_policy(&self, policy_id: &str) -> Result<String, ContractError> {
        let op = Operation::RevokePolicy {
            policy_id: policy_id.to_string(),
        };
        Ok(self.submit(op).await?.payload)
    }

    async fn validate_access_request(
        &self,
        request: AccessRequest,
    ) -> Result<String, ContractError> {
        Ok(self
            .submit(Operation::ValidateAccessRequest(request))
            .await?
            .payload)
    }
}

// =============================================================================
// TESTS
// =============================================================================
