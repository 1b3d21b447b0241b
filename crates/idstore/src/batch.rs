//! Bulk mutation in size-bounded, single-partition batches.
//!
//! Operations are grouped into atomic batches of at most the configured ceiling. A batch
//! the store rejects is retried one operation at a time; whatever still fails is counted,
//! and everything that succeeded stays committed.

use tracing::{debug, warn};

use idstore_table::{TableError, TableOperation, TableStore};

use crate::error::StoreError;

/// Tally of one bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub failed: usize,
    pub batches_committed: usize,
    /// Batches that were rejected and retried per operation.
    pub fallbacks: usize,
}

impl BatchReport {
    pub fn merge(&mut self, other: BatchReport) {
        self.attempted += other.attempted;
        self.failed += other.failed;
        self.batches_committed += other.batches_committed;
        self.fallbacks += other.fallbacks;
    }

    /// `PartialBulkFailure` if any operation ultimately failed.
    pub fn into_result(self) -> Result<BatchReport, StoreError> {
        if self.failed > 0 {
            return Err(StoreError::PartialBulkFailure {
                failed: self.failed,
                attempted: self.attempted,
            });
        }
        Ok(self)
    }
}

/// Accumulates operations and flushes them as atomic batches.
///
/// A batch is flushed when it reaches the ceiling, when an operation for a different
/// partition arrives, and on [`finish`](Self::finish).
pub struct BatchExecutor<'a, S> {
    store: &'a S,
    table: &'a str,
    ceiling: usize,
    pending: Vec<TableOperation>,
    report: BatchReport,
}

impl<'a, S: TableStore> BatchExecutor<'a, S> {
    pub fn new(store: &'a S, table: &'a str, ceiling: usize) -> Self {
        let ceiling = ceiling.clamp(1, idstore_table::MAX_BATCH_SIZE);
        Self {
            store,
            table,
            ceiling,
            pending: Vec::with_capacity(ceiling),
            report: BatchReport::default(),
        }
    }

    pub async fn push(&mut self, operation: TableOperation) {
        let other_partition = self
            .pending
            .first()
            .is_some_and(|first| first.partition_key() != operation.partition_key());
        if other_partition {
            self.flush().await;
        }
        self.pending.push(operation);
        if self.pending.len() >= self.ceiling {
            self.flush().await;
        }
    }

    pub async fn finish(mut self) -> BatchReport {
        self.flush().await;
        self.report
    }

    async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pending);
        self.report.attempted += batch.len();
        match self.store.execute_batch(self.table, &batch).await {
            Ok(()) => {
                debug!(table = self.table, size = batch.len(), "batch committed");
                self.report.batches_committed += 1;
            }
            Err(e) => {
                warn!(
                    table = self.table,
                    size = batch.len(),
                    error = %e,
                    "batch rejected, retrying operations individually"
                );
                self.report.fallbacks += 1;
                self.report.failed += run_each(self.store, self.table, &batch).await;
            }
        }
    }
}

/// Returns the number of operations that failed. Deleting an already absent row counts
/// as done.
async fn run_each<S: TableStore>(store: &S, table: &str, operations: &[TableOperation]) -> usize {
    let mut failed = 0;
    for operation in operations {
        match store.execute(table, operation).await {
            Ok(()) => {}
            Err(TableError::NotFound) if matches!(operation, TableOperation::Delete { .. }) => {}
            Err(e) => {
                warn!(
                    table,
                    partition_key = operation.partition_key(),
                    row_key = operation.row_key(),
                    error = %e,
                    "bulk operation failed"
                );
                failed += 1;
            }
        }
    }
    failed
}
