//! # Access Control - Policy Engine over a Transactional Ledger
//!
//! Creates, updates, revokes and enforces time, role and location scoped
//! access policies bound to devices stored on a key-value ledger.
//!
//! ## Purpose
//!
//! Policies live under `policy_<PolicyID>`. Each device keeps a reverse list
//! (`PolicyIDList`) of the policies bound to it, maintained on every policy
//! mutation. Access requests are evaluated against that list in stored order
//! and the first policy whose rules all pass grants access.
//!
//! ## Domain Rules
//!
//! | Rule | Enforcement Location |
//! |------|---------------------|
//! | Records written in canonical form | `domain/canonical.rs` - `canonicalize()` |
//! | Updates whitelisted to existing fields | `domain/updates.rs` - `PolicyUpdate::apply()` |
//! | Devices never created by this engine | `contract/device_index.rs` - `bind_devices()` |
//! | First matching policy wins | `contract/validator.rs` |
//! | Malformed input rejected before ledger access | `invocation.rs` - `Invocation::into_operation()` |
//! | All-or-nothing invocations | `service.rs` - `AccessControlService::submit()` |
//!
//! ## Match Rules (in order)
//!
//! | Rule | Passes when |
//! |------|-------------|
//! | `Role` | empty, or equal to the requested role |
//! | `UserLocation` | empty, or equal to the requested location |
//! | `PolicyExpiration` | unset, or request timestamp not after it |
//! | `AccessHours` | unset, or request UTC `HH:MM` within the inclusive window |
//! | `ObjectLocation` | rule disabled (default), empty, or equal to the device `Location` |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `Ledger` / `TransactionContext` | Transactional point reads, writes, deletes and range scans |
//! | `PolicyCatalog` | Policy enumeration strategy for GetAllPolicies |
//!
//! ## Usage Example
//!
//! ```ignore
//! use access_control::prelude::*;
//!
//! let service = create_test_service();
//! service.ledger().seed_device("D1", &serde_json::json!({ "ID": "D1" }))?;
//!
//! service
//!     .invoke(Invocation::new(
//!         "CreatePolicy",
//!         ["P1", r#"["D1"]"#, "admin", "09:00-17:00", "", "2030-01-01T00:00:00Z", "100", "true", "", "false"],
//!     ))
//!     .await?;
//!
//! let grant = service
//!     .invoke(Invocation::new("ValidateAccessRequest", ["D1", "admin", "2025-06-01T10:00:00Z", ""]))
//!     .await?;
//! assert_eq!(grant.payload, "Access granted under policy P1");
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod contract;
pub mod domain;
pub mod errors;
pub mod invocation;
pub mod ports;
pub mod service;
pub mod telemetry;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::canonical::canonicalize;
    pub use crate::domain::entities::{Device, Policy, PolicyScope};
    pub use crate::domain::matching::{evaluate, AccessRequest, MatchRules, Rejection};
    pub use crate::domain::updates::{AppliedUpdate, PolicyUpdate};
    pub use crate::domain::value_objects::{policy_key, AccessHours, DEFAULT_POLICY_PREFIX};

    // Ports
    pub use crate::ports::inbound::AccessControlApi;
    pub use crate::ports::outbound::{CommitReceipt, Ledger, PolicyCatalog, TransactionContext};

    // Adapters
    pub use crate::adapters::{FullScanCatalog, InMemoryLedger, MemoryTransaction, PrefixScanCatalog};

    // Contract
    pub use crate::contract::{AccessControlContract, Operation};
    pub use crate::invocation::Invocation;

    // Errors
    pub use crate::errors::{ContractError, ErrorKind, LedgerError};

    // Config & Telemetry
    pub use crate::config::{ConfigError, PolicyListing, ServiceConfig};
    pub use crate::telemetry::{init_tracing, TelemetryConfig, TelemetryError};

    // Service
    pub use crate::service::{create_test_service, AccessControlService, ServiceStats, Submission};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Contract name as registered on the ledger.
pub const CONTRACT_NAME: &str = "AccessControl";

// =============================================================================
// TESTS
// =============================================================================
