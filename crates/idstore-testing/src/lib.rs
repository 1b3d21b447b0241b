//! Test utilities for the identity store crates.
//!
//! Provides `FaultyTableStore` for failure injection and identity fixtures.
//! For `#[cfg(test)]` blocks and integration tests only.

pub mod fault;
pub mod fixture;
