//! # Access-Control Contract
//!
//! The exposed operations, each running against an explicit
//! [`TransactionContext`]. Nothing here commits or rolls back: an operation
//! that returns `Err` leaves staged writes behind and the caller must discard
//! the transaction.
//!
//! | Operation | Reads | Writes |
//! |-----------|-------|--------|
//! | CreatePolicy | listed devices | policy, listed devices |
//! | ReadPolicy | policy | - |
//! | GetAllPolicies | catalog scan | - |
//! | UpdatePolicy | policy (+ devices on reindex) | policy (+ devices on reindex) |
//! | RevokePolicy | policy, listed devices | listed devices, policy delete |
//! | ValidateAccessRequest | device, bound policies | - |

pub mod device_index;
mod policy_store;
mod validator;

pub use device_index::IndexChange;

use crate::config::ServiceConfig;
use crate::domain::entities::Policy;
use crate::domain::matching::AccessRequest;
use crate::domain::updates::PolicyUpdate;
use crate::domain::value_objects::policy_key;
use crate::errors::ContractError;
use crate::ports::outbound::{PolicyCatalog, TransactionContext};

// =============================================================================
// OPERATIONS
// =============================================================================

/// A fully parsed contract invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Store a policy and bind it to its devices.
    CreatePolicy(Policy),
    /// Fetch one policy record.
    ReadPolicy {
        /// Policy to read.
        policy_id: String,
    },
    /// List every policy record.
    GetAllPolicies,
    /// Overwrite existing fields of a policy.
    UpdatePolicy {
        /// Policy to update.
        policy_id: String,
        /// Fields to overwrite.
        update: PolicyUpdate,
    },
    /// Unbind and delete a policy.
    RevokePolicy {
        /// Policy to revoke.
        policy_id: String,
    },
    /// Evaluate an access request.
    ValidateAccessRequest(AccessRequest),
}

impl Operation {
    /// Exposed function name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreatePolicy(_) => "CreatePolicy",
            Self::ReadPolicy { .. } => "ReadPolicy",
            Self::GetAllPolicies => "GetAllPolicies",
            Self::UpdatePolicy { .. } => "UpdatePolicy",
            Self::RevokePolicy { .. } => "RevokePolicy",
            Self::ValidateAccessRequest(_) => "ValidateAccessRequest",
        }
    }

    /// Returns true if the operation never stages a write.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::ReadPolicy { .. } | Self::GetAllPolicies | Self::ValidateAccessRequest(_)
        )
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Stateless executor of [`Operation`]s.
pub struct AccessControlContract {
    config: ServiceConfig,
    catalog: Box<dyn PolicyCatalog>,
}

impl AccessControlContract {
    /// Create a contract with the catalog selected by `config.listing`.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        let catalog = config.catalog();
        Self { config, catalog }
    }

    /// Create a contract with an explicit listing strategy.
    #[must_use]
    pub fn with_catalog(config: ServiceConfig, catalog: Box<dyn PolicyCatalog>) -> Self {
        Self { config, catalog }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Name of the active listing strategy.
    #[must_use]
    pub fn catalog_name(&self) -> &'static str {
        self.catalog.name()
    }

    /// Runs `op` inside `ctx` and returns its text payload.
    pub async fn execute(
        &self,
        ctx: &mut dyn TransactionContext,
        op: Operation,
    ) -> Result<String, ContractError> {
        match op {
            Operation::CreatePolicy(policy) => self.create_policy(ctx, policy).await,
            Operation::ReadPolicy { policy_id } => self.read_policy(ctx, &policy_id).await,
            Operation::GetAllPolicies => self.get_all_policies(ctx).await,
            Operation::UpdatePolicy { policy_id, update } => {
                self.update_policy(ctx, &policy_id, &update).await
            }
            Operation::RevokePolicy { policy_id } => self.revoke_policy(ctx, &policy_id).await,
            Operation::ValidateAccessRequest(request) => {
                self.validate_access_request(ctx, &request).await
            }
        }
    }

    fn key_of(&self, policy_id: &str) -> String {
        policy_key(&self.config.policy_key_prefix, policy_id)
    }
}
