//! Identity data-access layer over a partitioned key-value table store.
//!
//! The store offers only single-partition atomicity. Uniqueness of usernames, emails and
//! external logins rests on index tables claimed by conditional insert. Writes that span
//! tables carry compensating actions.
//!
//! [`IdentityStore`] is the entry point for every operation.

pub mod batch;
pub mod config;
pub mod error;
pub mod index;
pub mod index_builder;
pub mod records;
pub mod relations;
pub mod saga;
pub mod scanner;
pub mod store;

pub use config::StoreConfig;
pub use error::{IdentifierKind, StoreError};
pub use relations::LoadedIdentity;
pub use store::IdentityStore;
