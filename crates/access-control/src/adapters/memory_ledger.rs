//! # In-Memory Ledger
//!
//! Snapshot-isolated key-value ledger with optimistic concurrency control.
//!
//! Each transaction reads from the committed state as of `begin`, overlaid
//! with its own staged writes. Commit re-checks the version of every key the
//! transaction read and rejects the whole write set if any of them moved.
//! Range scans are served from the snapshot and are not re-validated.

use crate::domain::canonical::canonicalize;
use crate::errors::LedgerError;
use crate::ports::outbound::{CommitReceipt, Ledger, TransactionContext};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Version recorded for a key that does not exist.
const ABSENT: u64 = 0;

/// A committed value and the ledger version that wrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

type Entries = BTreeMap<String, VersionedValue>;

#[derive(Debug, Default)]
struct LedgerState {
    entries: Arc<Entries>,
    version: u64,
}

// =============================================================================
// LEDGER
// =============================================================================

/// In-memory [`Ledger`] for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` under `key` outside of any transaction.
    pub fn seed(&self, key: &str, value: Vec<u8>) {
        let mut state = self.state.write();
        state.version += 1;
        let version = state.version;
        Arc::make_mut(&mut state.entries).insert(key.to_string(), VersionedValue { value, version });
    }

    /// Seeds a device record the way the asset contract would store it.
    pub fn seed_device(&self, object_id: &str, record: &Value) -> Result<(), serde_json::Error> {
        self.seed(object_id, canonicalize(record)?);
        Ok(())
    }

    /// Latest committed value of `key`.
    #[must_use]
    pub fn get_committed(&self, key: &str) -> Option<Vec<u8>> {
        self.state.read().entries.get(key).map(|v| v.value.clone())
    }

    /// Number of committed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Returns true if nothing has been committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current ledger version; bumped by every commit that writes.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.read().version
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, LedgerError> {
        let state = self.state.read();
        Ok(MemoryTransaction {
            tx_id: Uuid::new_v4(),
            snapshot: Arc::clone(&state.entries),
            read_set: BTreeMap::new(),
            write_set: BTreeMap::new(),
        })
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<CommitReceipt, LedgerError> {
        let digest = write_set_digest(&tx.write_set);
        let mut state = self.state.write();

        if tx.write_set.is_empty() {
            return Ok(CommitReceipt {
                tx_id: tx.tx_id,
                version: state.version,
                writes: 0,
                deletes: 0,
                write_set_digest: digest,
            });
        }

        for (key, observed) in &tx.read_set {
            let current = state.entries.get(key).map_or(ABSENT, |v| v.version);
            if current != *observed {
                debug!(tx_id = %tx.tx_id, key = %key, observed, current, "Read set invalidated");
                return Err(LedgerError::MvccConflict { key: key.clone() });
            }
        }

        state.version += 1;
        let version = state.version;
        let entries = Arc::make_mut(&mut state.entries);
        let (mut writes, mut deletes) = (0, 0);
        for (key, staged) in tx.write_set {
            match staged {
                Some(value) => {
                    entries.insert(key, VersionedValue { value, version });
                    writes += 1;
                }
                None => {
                    entries.remove(&key);
                    deletes += 1;
                }
            }
        }

        debug!(tx_id = %tx.tx_id, version, writes, deletes, "Write set applied");

        Ok(CommitReceipt {
            tx_id: tx.tx_id,
            version,
            writes,
            deletes,
            write_set_digest: digest,
        })
    }
}

/// SHA-256 over the write set in key order; deletes hash as a tombstone.
fn write_set_digest(write_set: &BTreeMap<String, Option<Vec<u8>>>) -> String {
    let mut hasher = Sha256::new();
    for (key, staged) in write_set {
        hasher.update((key.len() as u64).to_be_bytes());
        hasher.update(key.as_bytes());
        match staged {
            Some(value) => {
                hasher.update([1u8]);
                hasher.update((value.len() as u64).to_be_bytes());
                hasher.update(value);
            }
            None => hasher.update([0u8]),
        }
    }
    hex::encode(hasher.finalize())
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// A transaction opened by [`InMemoryLedger::begin`].
#[derive(Debug)]
pub struct MemoryTransaction {
    tx_id: Uuid,
    snapshot: Arc<Entries>,
    /// Version of each key at first read, `ABSENT` if it did not exist.
    read_set: BTreeMap<String, u64>,
    /// Staged writes; `None` marks a delete.
    write_set: BTreeMap<String, Option<Vec<u8>>>,
}

impl MemoryTransaction {
    /// Number of staged writes and deletes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.write_set.len()
    }
}

fn check_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        Err(LedgerError::EmptyKey)
    } else {
        Ok(())
    }
}

#[async_trait]
impl TransactionContext for MemoryTransaction {
    fn tx_id(&self) -> Uuid {
        self.tx_id
    }

    async fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        check_key(key)?;
        if let Some(staged) = self.write_set.get(key) {
            return Ok(staged.clone());
        }

        let committed = self.snapshot.get(key);
        self.read_set
            .entry(key.to_string())
            .or_insert_with(|| committed.map_or(ABSENT, |v| v.version));
        Ok(committed.map(|v| v.value.clone()))
    }

    async fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        check_key(key)?;
        self.write_set.insert(key.to_string(), Some(value));
        Ok(())
    }

    async fn delete_state(&mut self, key: &str) -> Result<(), LedgerError> {
        check_key(key)?;
        self.write_set.insert(key.to_string(), None);
        Ok(())
    }

    async fn get_state_by_range(
        &mut self,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        if !start.is_empty() && !end.is_empty() && start >= end {
            return Ok(Vec::new());
        }

        let mut merged: BTreeMap<&str, Option<&Vec<u8>>> = self
            .snapshot
            .range::<str, _>((lower, upper))
            .map(|(k, v)| (k.as_str(), Some(&v.value)))
            .collect();
        for (key, staged) in self.write_set.range::<str, _>((lower, upper)) {
            merged.insert(key.as_str(), staged.as_ref());
        }

        Ok(merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|value| (k.to_string(), value.clone())))
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
