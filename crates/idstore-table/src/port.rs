#![allow(async_fn_in_trait)]

use crate::entity::TableEntity;
use crate::error::TableError;
use crate::operation::TableOperation;
use crate::query::{ContinuationToken, QuerySegment, TableQuery};

/// Port onto a partitioned table store.
///
/// Tables are addressed by name. Every row is identified by (partition key, row key).
pub trait TableStore: Send + Sync {
    async fn create_table_if_not_exists(&self, table: &str) -> Result<(), TableError>;

    async fn execute(&self, table: &str, operation: &TableOperation) -> Result<(), TableError>;

    /// Apply all operations atomically. They must share one partition key, and there may be
    /// at most [`MAX_BATCH_SIZE`](crate::MAX_BATCH_SIZE) of them.
    async fn execute_batch(
        &self,
        table: &str,
        operations: &[TableOperation],
    ) -> Result<(), TableError>;

    async fn retrieve(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError>;

    /// Fetch one segment of `query`, starting at `continuation` when given.
    /// Rows come back ordered by (partition key, row key).
    async fn query_segment(
        &self,
        table: &str,
        query: &TableQuery,
        continuation: Option<&ContinuationToken>,
    ) -> Result<QuerySegment, TableError>;
}
