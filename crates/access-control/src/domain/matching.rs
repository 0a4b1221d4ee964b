//! # Match Rules
//!
//! Pure evaluation of one policy against one access request. The validator
//! walks a device's policy list and stops at the first policy for which
//! [`evaluate`] returns `Ok`.

use crate::domain::entities::{Device, Policy};
use crate::domain::value_objects::{clock_of, parse_timestamp, AccessHours};
use crate::errors::ContractError;
use chrono::{DateTime, Utc};
use std::fmt;

/// A parsed ValidateAccessRequest invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRequest {
    /// Device the requester wants to reach.
    pub object_id: String,
    /// Role claimed by the requester.
    pub role: String,
    /// Instant of the request, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    /// Location claimed by the requester.
    pub user_location: String,
}

impl AccessRequest {
    /// Validates the raw arguments. Fails before any ledger access.
    pub fn parse(
        object_id: &str,
        role: &str,
        timestamp: &str,
        user_location: &str,
    ) -> Result<Self, ContractError> {
        if object_id.is_empty() {
            return Err(ContractError::malformed("objectID", "must be non-empty"));
        }
        Ok(Self {
            object_id: object_id.to_string(),
            role: role.to_string(),
            timestamp: parse_timestamp("timestamp", timestamp)?,
            user_location: user_location.to_string(),
        })
    }
}

/// Switches for rules that are not part of the default rule set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchRules {
    /// Compare `ObjectLocation` against the device's `Location` field.
    pub enforce_object_location: bool,
}

/// Why a policy did not match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Policy requires a different role.
    RoleMismatch {
        /// Role the policy requires.
        required: String,
    },
    /// Policy requires a different requester location.
    UserLocationMismatch {
        /// Location the policy requires.
        required: String,
    },
    /// Request arrived after the policy expired.
    Expired {
        /// Policy expiration.
        expired_at: DateTime<Utc>,
    },
    /// Request clock falls outside the daily window.
    OutsideAccessHours {
        /// Permitted daily window.
        window: AccessHours,
        /// UTC `HH:MM` of the request.
        clock: String,
    },
    /// Device is not where the policy requires it to be.
    ObjectLocationMismatch {
        /// Location the policy requires.
        required: String,
        /// Location the device reports, if any.
        actual: Option<String>,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleMismatch { required } => write!(f, "role {required:?} required"),
            Self::UserLocationMismatch { required } => {
                write!(f, "user location {required:?} required")
            }
            Self::Expired { expired_at } => write!(f, "policy expired at {expired_at}"),
            Self::OutsideAccessHours { window, clock } => {
                write!(f, "{clock} outside access hours {window}")
            }
            Self::ObjectLocationMismatch { required, actual } => match actual {
                Some(actual) => write!(f, "device at {actual:?}, policy requires {required:?}"),
                None => write!(f, "device has no location, policy requires {required:?}"),
            },
        }
    }
}

/// Checks `policy` against `request`, in rule order.
///
/// Empty `Role`, `UserLocation` and `ObjectLocation` mean "any". An unset
/// expiration never expires; a request exactly at the expiration instant is
/// still allowed.
pub fn evaluate(
    policy: &Policy,
    request: &AccessRequest,
    device: &Device,
    rules: MatchRules,
) -> Result<(), Rejection> {
    if !policy.role.is_empty() && policy.role != request.role {
        return Err(Rejection::RoleMismatch {
            required: policy.role.clone(),
        });
    }

    if !policy.user_location.is_empty() && policy.user_location != request.user_location {
        return Err(Rejection::UserLocationMismatch {
            required: policy.user_location.clone(),
        });
    }

    if let Some(expired_at) = policy.policy_expiration {
        if request.timestamp > expired_at {
            return Err(Rejection::Expired { expired_at });
        }
    }

    if let Some(window) = &policy.access_hours {
        let clock = clock_of(&request.timestamp);
        if !window.contains(&clock) {
            return Err(Rejection::OutsideAccessHours {
                window: window.clone(),
                clock,
            });
        }
    }

    if rules.enforce_object_location
        && !policy.object_location.is_empty()
        && device.location() != Some(policy.object_location.as_str())
    {
        return Err(Rejection::ObjectLocationMismatch {
            required: policy.object_location.clone(),
            actual: device.location().map(str::to_string),
        });
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
