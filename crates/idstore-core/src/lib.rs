//! Ambient plumbing shared by the identity store crates: configuration loading and tracing setup.

pub mod config;
pub mod tracing;
