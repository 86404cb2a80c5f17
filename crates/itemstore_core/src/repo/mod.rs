//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the item store contract shared by every backend.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths normalize and validate the name before mutating the table.
//! - Each repository call is atomic with respect to the table it owns.
//! - Ids are assigned monotonically and never reused by the same store.

pub mod item_repo;
pub mod memory_repo;
