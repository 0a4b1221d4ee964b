//! Policy CRUD and the index maintenance each mutation triggers.

use super::device_index::{bind_devices, unbind_devices};
use super::AccessControlContract;
use crate::domain::canonical::canonicalize;
use crate::domain::entities::{Policy, PolicyScope};
use crate::domain::updates::PolicyUpdate;
use crate::domain::value_objects::check_objects_list;
use crate::errors::ContractError;
use crate::ports::outbound::TransactionContext;
use serde::de::DeserializeOwned;
use tracing::debug;

impl AccessControlContract {
    /// CreatePolicy: writes the policy, then binds it to every existing device
    /// in its scope. An existing record with the same id is overwritten.
    pub(crate) async fn create_policy(
        &self,
        ctx: &mut dyn TransactionContext,
        policy: Policy,
    ) -> Result<String, ContractError> {
        if policy.policy_id.is_empty() {
            return Err(ContractError::malformed("policyID", "must be non-empty"));
        }
        check_objects_list(
            "objectsList",
            &policy.objects_list,
            self.config.max_objects_per_policy,
        )?;

        let key = self.key_of(&policy.policy_id);
        self.store_policy(ctx, &key, &policy).await?;

        let change = bind_devices(ctx, &policy.policy_id, &policy.objects_list).await?;
        debug!(
            policy_id = %policy.policy_id,
            bound = change.updated.len(),
            missing = change.missing.len(),
            "Policy bound to devices"
        );

        Ok(format!(
            "Policy {} successfully created and assigned to {} objects.",
            policy.policy_id,
            policy.objects_list.len()
        ))
    }

    /// ReadPolicy: the stored record, verbatim.
    pub(crate) async fn read_policy(
        &self,
        ctx: &mut dyn TransactionContext,
        policy_id: &str,
    ) -> Result<String, ContractError> {
        let key = self.key_of(policy_id);
        let bytes = match ctx.get_state(&key).await? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                return Err(ContractError::PolicyDoesNotExist {
                    policy_id: policy_id.to_string(),
                })
            }
        };
        String::from_utf8(bytes).map_err(|e| ContractError::CorruptRecord {
            key,
            reason: e.to_string(),
        })
    }

    /// GetAllPolicies: every policy the catalog finds, as a JSON array.
    pub(crate) async fn get_all_policies(
        &self,
        ctx: &mut dyn TransactionContext,
    ) -> Result<String, ContractError> {
        let records = self.catalog.list_policies(ctx).await?;
        debug!(catalog = self.catalog.name(), count = records.len(), "Policies listed");

        let bytes = canonicalize(&records).map_err(|e| ContractError::CorruptRecord {
            key: String::new(),
            reason: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| ContractError::CorruptRecord {
            key: String::new(),
            reason: e.to_string(),
        })
    }

    /// UpdatePolicy: overwrites the named fields that already exist.
    ///
    /// The device index is left as it was unless `reindex_on_update` is set.
    pub(crate) async fn update_policy(
        &self,
        ctx: &mut dyn TransactionContext,
        policy_id: &str,
        update: &PolicyUpdate,
    ) -> Result<String, ContractError> {
        let key = self.key_of(policy_id);
        let current = self.load_policy(ctx, &key, policy_id).await?;
        let applied = update.apply(&current, self.config.max_objects_per_policy)?;

        if !applied.ignored.is_empty() {
            debug!(policy_id, ignored = ?applied.ignored, "Ignoring unknown policy fields");
        }

        if applied.changed.is_empty() {
            debug!(policy_id, "Update changes nothing");
        } else {
            self.store_policy(ctx, &key, &applied.policy).await?;
        }

        if self.config.reindex_on_update && applied.scope_changed() {
            let removed: Vec<String> = current
                .objects_list
                .iter()
                .filter(|id| !applied.policy.covers(id))
                .cloned()
                .collect();
            let added: Vec<String> = applied
                .policy
                .objects_list
                .iter()
                .filter(|id| !current.covers(id))
                .cloned()
                .collect();

            let unbound = unbind_devices(ctx, policy_id, &removed).await?;
            let bound = bind_devices(ctx, policy_id, &added).await?;
            debug!(
                policy_id,
                unbound = unbound.updated.len(),
                bound = bound.updated.len(),
                "Device index recomputed"
            );
        }

        Ok(format!("Policy {policy_id} successfully updated."))
    }

    /// RevokePolicy: unbinds the policy from its devices, then deletes it.
    ///
    /// Only the device scope is decoded, so records with stale or loosely
    /// typed rule fields can still be revoked.
    pub(crate) async fn revoke_policy(
        &self,
        ctx: &mut dyn TransactionContext,
        policy_id: &str,
    ) -> Result<String, ContractError> {
        let key = self.key_of(policy_id);
        let scope: PolicyScope = self.load_record(ctx, &key, policy_id).await?;

        let change = unbind_devices(ctx, policy_id, &scope.objects_list).await?;
        debug!(
            policy_id,
            unbound = change.updated.len(),
            missing = change.missing.len(),
            "Policy unbound from devices"
        );

        ctx.delete_state(&key).await?;
        Ok(format!("Policy {policy_id} successfully revoked and removed."))
    }

    /// Loads a policy that must exist.
    async fn load_policy(
        &self,
        ctx: &mut dyn TransactionContext,
        key: &str,
        policy_id: &str,
    ) -> Result<Policy, ContractError> {
        self.load_record(ctx, key, policy_id).await
    }

    async fn load_record<T: DeserializeOwned>(
        &self,
        ctx: &mut dyn TransactionContext,
        key: &str,
        policy_id: &str,
    ) -> Result<T, ContractError> {
        match ctx.get_state(key).await? {
            Some(bytes) if !bytes.is_empty() => {
                serde_json::from_slice(&bytes).map_err(|e| ContractError::CorruptRecord {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Err(ContractError::PolicyNotFound {
                policy_id: policy_id.to_string(),
            }),
        }
    }

    async fn store_policy(
        &self,
        ctx: &mut dyn TransactionContext,
        key: &str,
        policy: &Policy,
    ) -> Result<(), ContractError> {
        let bytes = canonicalize(policy).map_err(|e| ContractError::CorruptRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        ctx.put_state(key, bytes).await?;
        Ok(())
    }
}
