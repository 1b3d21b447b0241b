//! Domain types for the identity store.
//!
//! This crate contains only pure types with no storage dependencies: identifiers,
//! the identity aggregate and its child facts, and the store-safe key encoding.

pub mod id;
pub mod identity;
pub mod key;
