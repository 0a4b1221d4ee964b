//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the contract and the outside world.
//!
//! - **Driving Ports (Inbound)**: `AccessControlApi`
//! - **Driven Ports (Outbound)**: `Ledger`, `TransactionContext`, `PolicyCatalog`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
