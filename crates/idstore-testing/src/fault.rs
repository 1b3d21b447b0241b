//! Failure injection around any [`TableStore`].
//!
//! Wrap a real backend (usually `MemoryTableStore`) and register [`Fault`]s; matching
//! requests fail with a transport error before reaching the inner store. Every request is
//! also recorded so tests can assert on the exact I/O a store operation performed.

use std::sync::{Mutex, MutexGuard};

use idstore_table::{
    ContinuationToken, OperationKind, QuerySegment, TableEntity, TableError, TableOperation,
    TableQuery, TableStore,
};

/// A failure rule. Unset filters match anything.
#[derive(Debug, Clone)]
pub struct Fault {
    table: String,
    kind: OperationKind,
    partition_key: Option<String>,
    row_key: Option<String>,
    skip: usize,
    remaining: Option<usize>,
}

impl Fault {
    /// Fail every `kind` request against `table`.
    pub fn on(table: &str, kind: OperationKind) -> Self {
        Self {
            table: table.to_owned(),
            kind,
            partition_key: None,
            row_key: None,
            skip: 0,
            remaining: None,
        }
    }

    pub fn for_partition(mut self, partition_key: impl Into<String>) -> Self {
        self.partition_key = Some(partition_key.into());
        self
    }

    pub fn for_row(mut self, partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        self.partition_key = Some(partition_key.into());
        self.row_key = Some(row_key.into());
        self
    }

    /// Let the first `n` matching requests through.
    pub fn after(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Fire only for the next `n` matching requests.
    pub fn times(mut self, n: usize) -> Self {
        self.remaining = Some(n);
        self
    }

    fn matches(&self, req: &Request<'_>) -> bool {
        self.table == req.table
            && self.kind == req.kind
            && self
                .partition_key
                .as_deref()
                .is_none_or(|pk| Some(pk) == req.partition_key)
            && self
                .row_key
                .as_deref()
                .is_none_or(|rk| Some(rk) == req.row_key)
    }
}

/// One request observed by [`FaultyTableStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub table: String,
    pub kind: OperationKind,
    pub failed: bool,
}

struct Request<'a> {
    table: &'a str,
    kind: OperationKind,
    partition_key: Option<&'a str>,
    row_key: Option<&'a str>,
}

pub struct FaultyTableStore<S> {
    inner: S,
    faults: Mutex<Vec<Fault>>,
    calls: Mutex<Vec<Call>>,
}

impl<S: TableStore> FaultyTableStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inject(&self, fault: Fault) {
        lock(&self.faults).push(fault);
    }

    pub fn clear_faults(&self) {
        lock(&self.faults).clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Number of requests of `kind` made against `table`, failed or not.
    pub fn count(&self, table: &str, kind: OperationKind) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.table == table && c.kind == kind)
            .count()
    }

    fn check(&self, req: Request<'_>) -> Result<(), TableError> {
        let failed = {
            let mut faults = lock(&self.faults);
            match faults.iter().position(|f| f.matches(&req)) {
                Some(pos) if faults[pos].skip > 0 => {
                    faults[pos].skip -= 1;
                    false
                }
                Some(pos) => {
                    let exhausted = match faults[pos].remaining.as_mut() {
                        Some(n) => {
                            *n = n.saturating_sub(1);
                            *n == 0
                        }
                        None => false,
                    };
                    if exhausted {
                        faults.remove(pos);
                    }
                    true
                }
                None => false,
            }
        };
        lock(&self.calls).push(Call {
            table: req.table.to_owned(),
            kind: req.kind,
            failed,
        });
        if failed {
            return Err(TableError::Transport(anyhow::anyhow!(
                "injected {:?} failure on {}",
                req.kind,
                req.table
            )));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl<S: TableStore> TableStore for FaultyTableStore<S> {
    async fn create_table_if_not_exists(&self, table: &str) -> Result<(), TableError> {
        self.inner.create_table_if_not_exists(table).await
    }

    async fn execute(&self, table: &str, operation: &TableOperation) -> Result<(), TableError> {
        self.check(Request {
            table,
            kind: operation.kind(),
            partition_key: Some(operation.partition_key()),
            row_key: Some(operation.row_key()),
        })?;
        self.inner.execute(table, operation).await
    }

    async fn execute_batch(
        &self,
        table: &str,
        operations: &[TableOperation],
    ) -> Result<(), TableError> {
        self.check(Request {
            table,
            kind: OperationKind::Batch,
            partition_key: operations.first().map(TableOperation::partition_key),
            row_key: None,
        })?;
        self.inner.execute_batch(table, operations).await
    }

    async fn retrieve(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError> {
        self.check(Request {
            table,
            kind: OperationKind::Retrieve,
            partition_key: Some(partition_key),
            row_key: Some(row_key),
        })?;
        self.inner.retrieve(table, partition_key, row_key).await
    }

    async fn query_segment(
        &self,
        table: &str,
        query: &TableQuery,
        continuation: Option<&ContinuationToken>,
    ) -> Result<QuerySegment, TableError> {
        self.check(Request {
            table,
            kind: OperationKind::Query,
            partition_key: query.partition_key.as_deref(),
            row_key: None,
        })?;
        self.inner.query_segment(table, query, continuation).await
    }
}
