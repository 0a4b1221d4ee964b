//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the driven ports: the in-memory ledger and
//! the policy listing strategies.

pub mod catalog;
pub mod memory_ledger;

pub use catalog::*;
pub use memory_ledger::*;
