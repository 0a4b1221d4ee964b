//! # Error Types
//!
//! All error types for the access-control contract and its ledger port.

use thiserror::Error;

// =============================================================================
// ERROR KINDS
// =============================================================================

/// Failure classes surfaced to the transaction-submission caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Policy or device key absent where required.
    NotFound,
    /// Argument text is not parseable as the expected structure.
    MalformedInput,
    /// Device has no policy identifiers bound to it.
    NoPoliciesAssociated,
    /// No policy in the device's list satisfies every match rule.
    AccessDenied,
    /// A stored record could not be decoded during a required read.
    CorruptRecord,
    /// The ledger rejected or failed the operation.
    Ledger,
}

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Errors raised by the exposed contract operations.
///
/// Every variant aborts the invocation; the service rolls back all staged
/// writes before the error reaches the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Policy record missing (ReadPolicy).
    #[error("Policy {policy_id} does not exist.")]
    PolicyDoesNotExist {
        /// Requested policy.
        policy_id: String,
    },

    /// Policy record missing (UpdatePolicy, RevokePolicy).
    #[error("Policy {policy_id} not found.")]
    PolicyNotFound {
        /// Requested policy.
        policy_id: String,
    },

    /// Device record missing.
    #[error("Device {object_id} not found")]
    DeviceNotFound {
        /// Requested device.
        object_id: String,
    },

    /// Device exists but carries no policy identifiers.
    #[error("No policies associated with the device {object_id}")]
    NoPoliciesAssociated {
        /// Device without bound policies.
        object_id: String,
    },

    /// Every policy bound to the device rejected the request.
    #[error("Access denied: no policy matches the criteria for the device {object_id}")]
    AccessDenied {
        /// Device access was requested for.
        object_id: String,
    },

    /// Argument failed boundary validation.
    #[error("malformed input: {field}: {reason}")]
    MalformedInput {
        /// Argument or payload field that failed.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Stored record could not be decoded where the operation needs it.
    #[error("corrupt record at key {key}: {reason}")]
    CorruptRecord {
        /// Ledger key of the record.
        key: String,
        /// Decode failure.
        reason: String,
    },

    /// Ledger port failure.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl ContractError {
    /// Shorthand for a boundary validation failure.
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PolicyDoesNotExist { .. }
            | Self::PolicyNotFound { .. }
            | Self::DeviceNotFound { .. } => ErrorKind::NotFound,
            Self::NoPoliciesAssociated { .. } => ErrorKind::NoPoliciesAssociated,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::CorruptRecord { .. } => ErrorKind::CorruptRecord,
            Self::Ledger(_) => ErrorKind::Ledger,
        }
    }

    /// Returns true if the failure came from an optimistic concurrency conflict.
    ///
    /// Conflicting invocations are safe to resubmit against a fresh snapshot.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::MvccConflict { .. }))
    }
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors from the ledger access port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A key read by the transaction changed before commit.
    #[error("MVCC read conflict on key {key}")]
    MvccConflict {
        /// First stale key found.
        key: String,
    },

    /// Empty keys are not addressable.
    #[error("empty key")]
    EmptyKey,

    /// Backend unreachable or failing.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// TESTS
// =============================================================================
