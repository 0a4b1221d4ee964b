//! # Policy Catalogs
//!
//! Listing strategies for GetAllPolicies.
//!
//! [`FullScanCatalog`] walks the whole namespace, device records included,
//! and keeps whatever looks like a policy. [`PrefixScanCatalog`] restricts the
//! scan to the policy key prefix and yields the same records whenever every
//! policy lives under that prefix.

use crate::domain::entities::Policy;
use crate::domain::value_objects::prefix_range_end;
use crate::errors::ContractError;
use crate::ports::outbound::{PolicyCatalog, TransactionContext};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Keeps the entries that decode to a JSON object with a non-empty `PolicyID`.
///
/// Undecodable entries are logged and skipped; well-formed records of other
/// shapes are skipped silently.
fn policy_records(entries: Vec<(String, Vec<u8>)>) -> Vec<Value> {
    let scanned = entries.len();
    let records: Vec<Value> = entries
        .into_iter()
        .filter_map(|(key, bytes)| match serde_json::from_slice::<Value>(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping undecodable record");
                None
            }
        })
        .filter(|record| {
            record
                .get(Policy::ID_FIELD)
                .and_then(Value::as_str)
                .is_some_and(|id| !id.is_empty())
        })
        .collect();
    debug!(scanned, policies = records.len(), "Policy scan complete");
    records
}

// =============================================================================
// FULL SCAN
// =============================================================================

/// Scans `["", "")`, the entire key namespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullScanCatalog;

#[async_trait]
impl PolicyCatalog for FullScanCatalog {
    fn name(&self) -> &'static str {
        "full-scan"
    }

    async fn list_policies(
        &self,
        ctx: &mut dyn TransactionContext,
    ) -> Result<Vec<Value>, ContractError> {
        let entries = ctx.get_state_by_range("", "").await?;
        Ok(policy_records(entries))
    }
}

// =============================================================================
// PREFIX SCAN
// =============================================================================

/// Scans only keys beginning with the policy prefix.
#[derive(Clone, Debug)]
pub struct PrefixScanCatalog {
    prefix: String,
}

impl PrefixScanCatalog {
    /// Create a catalog over keys starting with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl PolicyCatalog for PrefixScanCatalog {
    fn name(&self) -> &'static str {
        "prefix-scan"
    }

    async fn list_policies(
        &self,
        ctx: &mut dyn TransactionContext,
    ) -> Result<Vec<Value>, ContractError> {
        let end = prefix_range_end(&self.prefix);
        let entries = ctx.get_state_by_range(&self.prefix, &end).await?;
        Ok(policy_records(entries))
    }
}

// =============================================================================
// TESTS
// =============================================================================
