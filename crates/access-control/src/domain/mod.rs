//! # Domain Layer (Inner Hexagon)
//!
//! Pure access-control logic: records, value objects, the canonical encoder,
//! match rules and partial updates.
//! NO I/O, NO async.

pub mod canonical;
pub mod entities;
pub mod matching;
pub mod updates;
pub mod value_objects;

pub use canonical::*;
pub use entities::*;
pub use matching::*;
pub use updates::*;
pub use value_objects::*;
