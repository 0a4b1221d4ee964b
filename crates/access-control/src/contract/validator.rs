//! Access validation: first matching policy on the device wins.

use super::device_index::load_device;
use super::AccessControlContract;
use crate::domain::entities::Policy;
use crate::domain::matching::{evaluate, AccessRequest};
use crate::errors::ContractError;
use crate::ports::outbound::TransactionContext;
use tracing::{debug, warn};

impl AccessControlContract {
    /// ValidateAccessRequest: walks the device's `PolicyIDList` in stored
    /// order and grants under the first policy whose rules all pass.
    ///
    /// Missing or undecodable policies are skipped. Never writes.
    pub(crate) async fn validate_access_request(
        &self,
        ctx: &mut dyn TransactionContext,
        request: &AccessRequest,
    ) -> Result<String, ContractError> {
        let object_id = request.object_id.as_str();
        let Some(device) = load_device(ctx, object_id).await? else {
            return Err(ContractError::DeviceNotFound {
                object_id: object_id.to_string(),
            });
        };

        if device.policy_ids().is_empty() {
            return Err(ContractError::NoPoliciesAssociated {
                object_id: object_id.to_string(),
            });
        }

        let rules = self.config.match_rules();
        for policy_id in device.policy_ids() {
            let key = self.key_of(policy_id);
            let bytes = match ctx.get_state(&key).await? {
                Some(bytes) if !bytes.is_empty() => bytes,
                _ => {
                    debug!(object_id, policy_id = %policy_id, "Bound policy missing, skipping");
                    continue;
                }
            };

            let policy: Policy = match serde_json::from_slice(&bytes) {
                Ok(policy) => policy,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping undecodable policy");
                    continue;
                }
            };

            match evaluate(&policy, request, &device, rules) {
                Ok(()) => return Ok(format!("Access granted under policy {policy_id}")),
                Err(rejection) => {
                    debug!(object_id, policy_id = %policy_id, reason = %rejection, "Policy rejected request");
                }
            }
        }

        Err(ContractError::AccessDenied {
            object_id: object_id.to_string(),
        })
    }
}
