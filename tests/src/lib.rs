//! # Access Ledger Test Suite
//!
//! Unified test crate exercising the access-control engine end to end
//! through `AccessControlService` and the in-memory ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── policy_lifecycle.rs   # Create / update / revoke and the device index
//!     ├── access_validation.rs  # Match rules and the reference scenario
//!     └── concurrency.rs        # MVCC conflicts between concurrent invocations
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ac-tests
//!
//! # By flow
//! cargo test -p ac-tests integration::access_validation::
//! ```

pub mod integration;
