//! # Invocation Envelope
//!
//! Transaction submitters address the contract by function name with
//! positional string arguments. This module turns that envelope into a typed
//! [`Operation`], rejecting malformed arguments before any ledger access.
//!
//! | Function | Arguments |
//! |----------|-----------|
//! | `CreatePolicy` | policyID, objectsList (JSON array), role, accessHours, objectLocation, policyExpiration, maxRequestsPerHour, notifyOnAccess, userLocation, allowCloudExport |
//! | `ReadPolicy` | policyID |
//! | `GetAllPolicies` | - |
//! | `UpdatePolicy` | policyID, updatedFields (JSON object) |
//! | `RevokePolicy` | policyID |
//! | `ValidateAccessRequest` | objectID, role, timestamp, userLocation |

use crate::contract::Operation;
use crate::domain::entities::Policy;
use crate::domain::matching::AccessRequest;
use crate::domain::updates::PolicyUpdate;
use crate::domain::value_objects::{self, parse_flag, AccessHours};
use crate::errors::ContractError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A function call as submitted in a transaction proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Exposed function name, e.g. `CreatePolicy`.
    pub function: String,
    /// Positional string arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Invocation {
    /// Builds an invocation from a function name and its arguments.
    pub fn new<I, S>(function: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a JSON envelope `{"function": ..., "args": [...]}`.
    pub fn from_json(text: &str) -> Result<Self, ContractError> {
        serde_json::from_str(text).map_err(|e| ContractError::malformed("invocation", e.to_string()))
    }

    /// Validates the arguments and produces the typed operation.
    pub fn into_operation(self) -> Result<Operation, ContractError> {
        let function = self.function.as_str();
        let args = self.args.as_slice();
        match function {
            "CreatePolicy" => {
                let [policy_id, objects, role, hours, object_location, expiration, max_requests, notify, user_location, cloud] =
                    arity::<10>(function, args)?;
                Ok(Operation::CreatePolicy(Policy {
                    policy_id: non_empty("policyID", policy_id)?,
                    objects_list: parse_objects_list(objects)?,
                    role: role.clone(),
                    access_hours: parse_access_hours(hours)?,
                    object_location: object_location.clone(),
                    policy_expiration: parse_expiration(expiration)?,
                    max_requests_per_hour: parse_request_cap(max_requests)?,
                    notify_on_access: parse_flag("notifyOnAccess", notify)?,
                    user_location: user_location.clone(),
                    allow_cloud_export: parse_flag("allowCloudExport", cloud)?,
                }))
            }
            "ReadPolicy" => {
                let [policy_id] = arity::<1>(function, args)?;
                Ok(Operation::ReadPolicy {
                    policy_id: non_empty("policyID", policy_id)?,
                })
            }
            "GetAllPolicies" => {
                let [] = arity::<0>(function, args)?;
                Ok(Operation::GetAllPolicies)
            }
            "UpdatePolicy" => {
                let [policy_id, fields] = arity::<2>(function, args)?;
                Ok(Operation::UpdatePolicy {
                    policy_id: non_empty("policyID", policy_id)?,
                    update: PolicyUpdate::parse(fields)?,
                })
            }
            "RevokePolicy" => {
                let [policy_id] = arity::<1>(function, args)?;
                Ok(Operation::RevokePolicy {
                    policy_id: non_empty("policyID", policy_id)?,
                })
            }
            "ValidateAccessRequest" => {
                let [object_id, role, timestamp, user_location] = arity::<4>(function, args)?;
                Ok(Operation::ValidateAccessRequest(AccessRequest::parse(
                    object_id,
                    role,
                    timestamp,
                    user_location,
                )?))
            }
            other => Err(ContractError::malformed(
                "function",
                format!("unknown function {other:?}"),
            )),
        }
    }
}

fn arity<'a, const N: usize>(
    function: &str,
    args: &'a [String],
) -> Result<&'a [String; N], ContractError> {
    args.try_into().map_err(|_| {
        ContractError::malformed(
            "args",
            format!("{function} expects {N} arguments, got {}", args.len()),
        )
    })
}

fn non_empty(field: &str, value: &str) -> Result<String, ContractError> {
    if value.is_empty() {
        return Err(ContractError::malformed(field, "must be non-empty"));
    }
    Ok(value.to_string())
}

fn parse_objects_list(text: &str) -> Result<Vec<String>, ContractError> {
    serde_json::from_str(text)
        .map_err(|e| ContractError::malformed("objectsList", format!("expected a JSON array of strings: {e}")))
}

fn parse_access_hours(text: &str) -> Result<Option<AccessHours>, ContractError> {
    if text.is_empty() {
        return Ok(None);
    }
    AccessHours::parse(text)
        .map(Some)
        .map_err(|reason| ContractError::malformed("accessHours", reason))
}

fn parse_expiration(text: &str) -> Result<Option<DateTime<Utc>>, ContractError> {
    if text.is_empty() {
        return Ok(None);
    }
    value_objects::parse_expiration("policyExpiration", text).map(Some)
}

fn parse_request_cap(text: &str) -> Result<u32, ContractError> {
    text.trim().parse().map_err(|_| {
        ContractError::malformed(
            "maxRequestsPerHour",
            format!("expected an unsigned integer, got {text:?}"),
        )
    })
}

// =============================================================================
// TESTS
// =============================================================================
