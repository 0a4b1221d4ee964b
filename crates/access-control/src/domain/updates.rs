//! # Policy Updates
//!
//! Partial updates are whitelisted to fields already present on the stored
//! policy. Unknown keys are ignored rather than extending the schema, and the
//! result is re-validated against the typed record.

use crate::domain::entities::Policy;
use crate::domain::value_objects::check_objects_list;
use crate::errors::ContractError;
use serde_json::{Map, Value};

const FIELD: &str = "updatedFields";

/// A parsed `updatedFields` payload.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyUpdate {
    fields: Map<String, Value>,
}

/// Outcome of applying a [`PolicyUpdate`] to a stored policy.
#[derive(Clone, Debug)]
pub struct AppliedUpdate {
    /// The policy after the update.
    pub policy: Policy,
    /// Whitelisted fields whose value changed.
    pub changed: Vec<String>,
    /// Keys dropped because the policy has no such field.
    pub ignored: Vec<String>,
}

impl AppliedUpdate {
    /// Returns true if the device scope was modified.
    #[must_use]
    pub fn scope_changed(&self) -> bool {
        self.changed.iter().any(|f| f == Policy::OBJECTS_FIELD)
    }
}

impl PolicyUpdate {
    /// Parses the JSON object of fields to overwrite.
    pub fn parse(text: &str) -> Result<Self, ContractError> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(ContractError::malformed(
                FIELD,
                format!("expected a JSON object, got {}", json_type(&other)),
            )),
            Err(e) => Err(ContractError::malformed(FIELD, e.to_string())),
        }
    }

    /// Keys carried by the payload.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Applies the update to `policy`.
    ///
    /// Every named field the policy already has is overwritten, with one
    /// exception: `PolicyID` is the record's identity and is part of its ledger
    /// key, so it may only be repeated with its current value. Changing it is
    /// rejected as malformed input instead of leaving the record under a key
    /// that no longer matches its id.
    pub fn apply(&self, policy: &Policy, max_objects: usize) -> Result<AppliedUpdate, ContractError> {
        let mut stored = match serde_json::to_value(policy) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return Err(ContractError::CorruptRecord {
                    key: policy.policy_id.clone(),
                    reason: "policy does not encode as an object".to_string(),
                })
            }
        };

        let mut changed = Vec::new();
        let mut ignored = Vec::new();

        for (key, value) in &self.fields {
            let Some(current) = stored.get(key) else {
                ignored.push(key.clone());
                continue;
            };

            if key == Policy::ID_FIELD {
                if value.as_str() != Some(policy.policy_id.as_str()) {
                    return Err(ContractError::malformed(FIELD, "PolicyID cannot be changed"));
                }
                continue;
            }

            if current != value {
                changed.push(key.clone());
            }
            stored.insert(key.clone(), value.clone());
        }

        let updated: Policy = serde_json::from_value(Value::Object(stored))
            .map_err(|e| ContractError::malformed(FIELD, e.to_string()))?;
        check_objects_list(FIELD, &updated.objects_list, max_objects)?;

        Ok(AppliedUpdate {
            policy: updated,
            changed,
            ignored,
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// TESTS
// =============================================================================
