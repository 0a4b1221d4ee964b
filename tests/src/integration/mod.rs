//! # Integration Flows
//!
//! Shared fixtures for the flow modules.

pub mod access_validation;
pub mod concurrency;
pub mod policy_lifecycle;

use access_control::prelude::*;
use serde_json::{json, Value};

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("access_control=debug")
        .with_test_writer()
        .try_init();
}

/// A service over a fresh ledger seeded with `devices`.
pub fn service_with_devices(
    config: ServiceConfig,
    devices: &[&str],
) -> AccessControlService<InMemoryLedger> {
    init_test_tracing();
    let ledger = InMemoryLedger::new();
    for id in devices {
        ledger
            .seed_device(id, &json!({ "ID": id, "Owner": "asset-contract" }))
            .expect("device record encodes");
    }
    AccessControlService::new(ledger, config)
}

/// CreatePolicy arguments with every optional rule unset.
pub fn open_policy(policy_id: &str, objects: &[&str]) -> Invocation {
    policy_with(policy_id, objects, "", "", "")
}

/// CreatePolicy arguments with a role, access window and expiration.
pub fn policy_with(
    policy_id: &str,
    objects: &[&str],
    role: &str,
    hours: &str,
    expiration: &str,
) -> Invocation {
    let objects = serde_json::to_string(objects).expect("ids encode");
    Invocation::new(
        "CreatePolicy",
        [
            policy_id,
            objects.as_str(),
            role,
            hours,
            "",
            expiration,
            "60",
            "false",
            "",
            "false",
        ],
    )
}

/// ValidateAccessRequest arguments.
pub fn access(object_id: &str, role: &str, timestamp: &str) -> Invocation {
    Invocation::new("ValidateAccessRequest", [object_id, role, timestamp, ""])
}

/// The device's committed `PolicyIDList`, if the device and list exist.
pub fn bound_policies(ledger: &InMemoryLedger, object_id: &str) -> Option<Vec<String>> {
    let bytes = ledger.get_committed(object_id)?;
    let record: Value = serde_json::from_slice(&bytes).ok()?;
    serde_json::from_value(record.get("PolicyIDList")?.clone()).ok()
}
