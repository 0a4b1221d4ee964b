//! # Device Index Maintainer
//!
//! Keeps each device's `PolicyIDList` in step with policy scopes. Devices are
//! owned by the asset contract: missing ones are skipped, never created, and
//! fields this contract does not own are written back untouched.

use crate::domain::canonical::canonicalize;
use crate::domain::entities::Device;
use crate::errors::ContractError;
use crate::ports::outbound::TransactionContext;
use tracing::debug;

/// What an index pass did to the devices it visited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexChange {
    /// Devices rewritten.
    pub updated: Vec<String>,
    /// Devices that already had the desired membership.
    pub unchanged: Vec<String>,
    /// Devices with no (or an empty) record.
    pub missing: Vec<String>,
}

/// Reads and decodes a device record. Absent and zero-length records are `None`.
pub(crate) async fn load_device(
    ctx: &mut dyn TransactionContext,
    object_id: &str,
) -> Result<Option<Device>, ContractError> {
    let Some(bytes) = ctx.get_state(object_id).await? else {
        return Ok(None);
    };
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ContractError::CorruptRecord {
            key: object_id.to_string(),
            reason: e.to_string(),
        })
}

async fn store_device(
    ctx: &mut dyn TransactionContext,
    object_id: &str,
    device: &Device,
) -> Result<(), ContractError> {
    let bytes = canonicalize(device).map_err(|e| ContractError::CorruptRecord {
        key: object_id.to_string(),
        reason: e.to_string(),
    })?;
    ctx.put_state(object_id, bytes).await?;
    Ok(())
}

/// Appends `policy_id` to every existing device in `object_ids`.
pub(crate) async fn bind_devices(
    ctx: &mut dyn TransactionContext,
    policy_id: &str,
    object_ids: &[String],
) -> Result<IndexChange, ContractError> {
    let mut change = IndexChange::default();
    for object_id in object_ids {
        let Some(mut device) = load_device(ctx, object_id).await? else {
            debug!(policy_id, object_id = %object_id, "Device not found, skipping bind");
            change.missing.push(object_id.clone());
            continue;
        };
        if device.bind(policy_id) {
            store_device(ctx, object_id, &device).await?;
            change.updated.push(object_id.clone());
        } else {
            change.unchanged.push(object_id.clone());
        }
    }
    Ok(change)
}

/// Removes `policy_id` from every existing device in `object_ids`.
pub(crate) async fn unbind_devices(
    ctx: &mut dyn TransactionContext,
    policy_id: &str,
    object_ids: &[String],
) -> Result<IndexChange, ContractError> {
    let mut change = IndexChange::default();
    for object_id in object_ids {
        let Some(mut device) = load_device(ctx, object_id).await? else {
            debug!(policy_id, object_id = %object_id, "Device not found, skipping unbind");
            change.missing.push(object_id.clone());
            continue;
        };
        if device.unbind(policy_id) {
            store_device(ctx, object_id, &device).await?;
            change.updated.push(object_id.clone());
        } else {
            change.unchanged.push(object_id.clone());
        }
    }
    Ok(change)
}
