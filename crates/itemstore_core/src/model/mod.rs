//! Domain model for the item store.
//!
//! # Invariants
//! - Every item is identified by a store-assigned `ItemId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod item;
