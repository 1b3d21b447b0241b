//! Port onto a partitioned, schema-less key-value table store.
//!
//! The store offers single-row operations, atomic batches confined to one partition,
//! point reads, and paged range queries resumed through opaque continuation tokens.
//! There are no cross-partition or cross-table transactions.
//!
//! [`memory::MemoryTableStore`] is a complete in-process backend with the same semantics.

pub mod entity;
pub mod error;
pub mod memory;
pub mod operation;
pub mod port;
pub mod query;

pub use entity::{PropertyValue, TableEntity, clamp_datetime, min_datetime};
pub use error::TableError;
pub use operation::{OperationKind, TableOperation};
pub use port::TableStore;
pub use query::{ContinuationToken, QuerySegment, TableQuery};

/// Maximum number of operations the store accepts in one atomic batch.
pub const MAX_BATCH_SIZE: usize = 100;
