//! # Core Domain Entities
//!
//! `Policy` records owned by this contract and `Device` records owned by the
//! asset contract, of which only the policy index is touched here.

use crate::domain::value_objects::{lenient_u32, opt_access_hours, opt_timestamp, AccessHours};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// POLICY
// =============================================================================

/// A named rule set granting conditional access to a set of devices.
///
/// Every field is always written; empty strings stand for "unset" on the
/// optional rules. Fields missing from an older record read as their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// External identity.
    #[serde(rename = "PolicyID")]
    pub policy_id: String,
    /// Devices this policy applies to, in assignment order.
    #[serde(rename = "ObjectsList")]
    pub objects_list: Vec<String>,
    /// Required role; empty means any role.
    #[serde(rename = "Role")]
    pub role: String,
    /// Daily window the request must fall into.
    #[serde(rename = "AccessHours", with = "opt_access_hours")]
    pub access_hours: Option<AccessHours>,
    /// Location the device must report; inactive unless enabled in config.
    #[serde(rename = "ObjectLocation")]
    pub object_location: String,
    /// Requests strictly after this instant are rejected.
    #[serde(rename = "PolicyExpiration", with = "opt_timestamp")]
    pub policy_expiration: Option<DateTime<Utc>>,
    /// Stored for downstream rate limiters; never enforced here.
    #[serde(rename = "MaxRequestsPerHour", deserialize_with = "lenient_u32::deserialize")]
    pub max_requests_per_hour: u32,
    /// Whether the device owner wants access notifications.
    #[serde(rename = "NotifyOnAccess")]
    pub notify_on_access: bool,
    /// Required requester location; empty means anywhere.
    #[serde(rename = "UserLocation")]
    pub user_location: String,
    /// Whether data obtained under this policy may leave the premises.
    #[serde(rename = "AllowCloudExport")]
    pub allow_cloud_export: bool,
}

impl Policy {
    /// Stored field name of the policy identity.
    pub const ID_FIELD: &'static str = "PolicyID";

    /// Stored field name of the device scope.
    pub const OBJECTS_FIELD: &'static str = "ObjectsList";

    /// Returns true if the policy lists `object_id` in its scope.
    #[must_use]
    pub fn covers(&self, object_id: &str) -> bool {
        self.objects_list.iter().any(|id| id == object_id)
    }
}

/// The device scope of a stored policy, decoded without the match rules.
///
/// Unbinding a policy needs nothing else, so a record whose rules no longer
/// decode can still be revoked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PolicyScope {
    /// Devices the policy applies to.
    #[serde(rename = "ObjectsList", default)]
    pub objects_list: Vec<String>,
}

// =============================================================================
// DEVICE
// =============================================================================

/// An addressable resource policies are attached to.
///
/// The record is written by the asset contract; fields this contract does not
/// own are carried through `extra` untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Policy identifiers bound to this device, in evaluation order.
    #[serde(
        rename = "PolicyIDList",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_ids: Option<Vec<String>>,
    /// Every other field of the record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// Stored field holding the device's physical location.
    pub const LOCATION_FIELD: &'static str = "Location";

    /// Bound policy identifiers; empty if the record has no list.
    #[must_use]
    pub fn policy_ids(&self) -> &[String] {
        self.policy_ids.as_deref().unwrap_or_default()
    }

    /// Appends `policy_id` unless already bound. Returns true if the record changed.
    pub fn bind(&mut self, policy_id: &str) -> bool {
        let ids = self.policy_ids.get_or_insert_with(Vec::new);
        if ids.iter().any(|id| id == policy_id) {
            return false;
        }
        ids.push(policy_id.to_string());
        true
    }

    /// Removes every occurrence of `policy_id`. Returns true if the record changed.
    ///
    /// Records without a list are left as they are.
    pub fn unbind(&mut self, policy_id: &str) -> bool {
        match self.policy_ids.as_mut() {
            Some(ids) => {
                let before = ids.len();
                ids.retain(|id| id != policy_id);
                ids.len() != before
            }
            None => false,
        }
    }

    /// Location reported by the asset contract, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.extra.get(Self::LOCATION_FIELD).and_then(Value::as_str)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_policy() -> Policy {
        Policy {
            policy_id: "P1".to_string(),
            objects_list: vec!["D1".to_string(), "D2".to_string()],
            role: "admin".to_string(),
            access_hours: Some(AccessHours::parse("09:00-17:00").unwrap()),
            object_location: String::new(),
            policy_expiration: None,
            max_requests_per_hour: 100,
            notify_on_access: true,
            user_location: String::new(),
            allow_cloud_export: false,
        }
    }

    #[test]
    fn test_policy_wire_shape() {
        let value = serde_json::to_value(sample_policy()).unwrap();
        assert_eq!(value["PolicyID"], "P1");
        assert_eq!(value["AccessHours"], "09:00-17:00");
        assert_eq!(value["PolicyExpiration"], "");
        assert_eq!(value["MaxRequestsPerHour"], 100);
        assert_eq!(value.as_object().unwrap().len(), 10);
    }

    #[test]
    fn test_policy_accepts_textual_request_cap() {
        let mut value = serde_json::to_value(sample_policy()).unwrap();
        value["MaxRequestsPerHour"] = json!("250");
        let policy: Policy = serde_json::from_value(value).unwrap();
        assert_eq!(policy.max_requests_per_hour, 250);
        assert!(policy.covers("D2"));
        assert!(!policy.covers("D3"));
    }

    #[test]
    fn test_policy_reads_loosely_typed_record() {
        let policy: Policy = serde_json::from_value(json!({
            "PolicyID": "P1",
            "ObjectsList": ["D1"],
            "Role": "admin",
            "AccessHours": "22:00-06:00",
            "PolicyExpiration": "2030-01-01",
            "MaxRequestsPerHour": "100",
            "NotifyOnAccess": true,
        }))
        .unwrap();
        assert_eq!(policy.max_requests_per_hour, 100);
        assert!(policy.user_location.is_empty());
        assert!(!policy.allow_cloud_export);
        assert_eq!(
            serde_json::to_value(&policy).unwrap()["PolicyExpiration"],
            "2030-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_scope_ignores_rule_fields() {
        let scope: PolicyScope = serde_json::from_value(json!({
            "ObjectsList": ["D1", "D2"],
            "AccessHours": "whenever",
            "PolicyExpiration": 17,
        }))
        .unwrap();
        assert_eq!(scope.objects_list, ["D1", "D2"]);

        let empty: PolicyScope = serde_json::from_value(json!({ "PolicyID": "P1" })).unwrap();
        assert!(empty.objects_list.is_empty());
    }

    #[test]
    fn test_device_preserves_foreign_fields() {
        let device: Device = serde_json::from_value(json!({
            "ID": "D1",
            "Owner": "alice",
            "Location": "lab-3",
        }))
        .unwrap();
        assert!(device.policy_ids.is_none());
        assert_eq!(device.location(), Some("lab-3"));

        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["Owner"], "alice");
        assert!(value.get("PolicyIDList").is_none());
    }

    #[test]
    fn test_device_bind_is_idempotent() {
        let mut device = Device::default();
        assert!(device.bind("P1"));
        assert!(!device.bind("P1"));
        assert!(device.bind("P2"));
        assert_eq!(device.policy_ids(), ["P1", "P2"]);
    }

    #[test]
    fn test_device_unbind() {
        let mut device = Device::default();
        assert!(!device.unbind("P1"));
        assert!(device.policy_ids.is_none());

        device.bind("P1");
        device.bind("P2");
        assert!(device.unbind("P1"));
        assert!(!device.unbind("P1"));
        assert_eq!(device.policy_ids(), ["P2"]);
    }
}
