//! # Driving Ports (API - Inbound)
//!
//! The six operations exposed to transaction-submission callers. Each call is
//! one atomic invocation: it either commits all of its writes or none.

use crate::domain::entities::Policy;
use crate::domain::matching::AccessRequest;
use crate::domain::updates::PolicyUpdate;
use crate::errors::ContractError;
use async_trait::async_trait;

/// Public API of the access-control contract.
///
/// Successful calls return the text payload handed back to the submitter.
#[async_trait]
pub trait AccessControlApi: Send + Sync {
    /// Stores `policy` (overwriting any previous record with the same id)
    /// and binds it to every existing device in its scope.
    async fn create_policy(&self, policy: Policy) -> Result<String, ContractError>;

    /// Returns the stored policy record as canonical JSON text.
    async fn read_policy(&self, policy_id: &str) -> Result<String, ContractError>;

    /// Returns every stored policy as a JSON array.
    async fn get_all_policies(&self) -> Result<String, ContractError>;

    /// Overwrites the fields of `policy_id` named in `update`.
    async fn update_policy(
        &self,
        policy_id: &str,
        update: PolicyUpdate,
    ) -> Result<String, ContractError>;

    /// Unbinds `policy_id` from its devices and deletes it.
    async fn revoke_policy(&self, policy_id: &str) -> Result<String, ContractError>;

    /// Grants or denies `request` under the device's bound policies.
    async fn validate_access_request(
        &self,
        request: AccessRequest,
    ) -> Result<String, ContractError>;
}
