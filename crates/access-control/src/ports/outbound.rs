//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the access-control contract depends on:
//! - Transactional key-value ledger (point reads, writes, deletes, range scans)
//! - Policy listing strategy used by GetAllPolicies

use crate::errors::{ContractError, LedgerError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// TRANSACTION CONTEXT
// =============================================================================

/// Transaction-scoped handle onto the ledger.
///
/// Every contract operation receives one of these explicitly. Reads observe
/// the snapshot taken when the transaction began plus the transaction's own
/// staged writes. Nothing becomes visible to other transactions until the
/// owning [`Ledger`] commits it.
#[async_trait]
pub trait TransactionContext: Send {
    /// Identifier of this transaction, used for log correlation.
    fn tx_id(&self) -> Uuid;

    /// Point lookup.
    ///
    /// # Returns
    ///
    /// * `Some(bytes)` - If the key holds a value
    /// * `None` - If the key is absent or deleted in this transaction
    async fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Stages a write of `value` under `key`.
    async fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Stages a delete of `key`. Deleting an absent key is a no-op.
    async fn delete_state(&mut self, key: &str) -> Result<(), LedgerError>;

    /// Ordered scan over `[start, end)`.
    ///
    /// An empty `start` means the beginning of the namespace and an empty
    /// `end` means its end, so `("", "")` visits every key.
    async fn get_state_by_range(
        &mut self,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, LedgerError>;
}

// =============================================================================
// LEDGER
// =============================================================================

/// Summary of a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Transaction that was committed.
    pub tx_id: Uuid,
    /// Ledger version after the commit.
    pub version: u64,
    /// Number of keys written.
    pub writes: usize,
    /// Number of keys deleted.
    pub deletes: usize,
    /// Hex SHA-256 over the ordered write set.
    pub write_set_digest: String,
}

/// Host ledger: opens transactions and applies them atomically.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Concrete transaction handle.
    type Transaction: TransactionContext + 'static;

    /// Opens a transaction against the current committed state.
    async fn begin(&self) -> Result<Self::Transaction, LedgerError>;

    /// Applies every staged write of `tx` or none of them.
    ///
    /// # Errors
    ///
    /// * `LedgerError::MvccConflict` - A key read by `tx` changed since it began
    async fn commit(&self, tx: Self::Transaction) -> Result<CommitReceipt, LedgerError>;

    /// Discards `tx` and all of its staged writes.
    async fn rollback(&self, tx: Self::Transaction) -> Result<(), LedgerError> {
        drop(tx);
        Ok(())
    }
}

// =============================================================================
// POLICY CATALOG
// =============================================================================

/// Strategy for enumerating stored policies.
///
/// Implementations keep only JSON objects carrying a non-empty `PolicyID`
/// and skip undecodable records with a warning.
#[async_trait]
pub trait PolicyCatalog: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns every policy record visible to `ctx`, in key order.
    async fn list_policies(
        &self,
        ctx: &mut dyn TransactionContext,
    ) -> Result<Vec<Value>, ContractError>;
}
