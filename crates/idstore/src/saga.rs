//! Multi-table writes with compensation.
//!
//! The store has no cross-table transaction, so a write spanning tables runs as a saga:
//! each completed step registers the operations that undo it, and the first failing step
//! undoes the completed ones in reverse order. Undo failures are logged and reported as
//! [`CleanupOutcome`]s, never returned as errors.

use std::future::Future;

use tracing::{info, warn};

use idstore_table::{TableError, TableOperation, TableStore};

use crate::error::StoreError;

/// One compensating write.
#[derive(Debug, Clone)]
pub struct Undo {
    pub table: String,
    pub operation: TableOperation,
}

impl Undo {
    pub fn delete(table: &str, partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            table: table.to_owned(),
            operation: TableOperation::delete(partition_key, row_key),
        }
    }
}

/// Result of one best-effort step: a compensation or a cleanup pass.
#[derive(Debug)]
pub struct CleanupOutcome {
    pub label: &'static str,
    pub error: Option<StoreError>,
}

impl CleanupOutcome {
    pub fn of<T, E: Into<StoreError>>(label: &'static str, result: Result<T, E>) -> Self {
        Self {
            label,
            error: result.err().map(Into::into),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Saga<'a, S> {
    store: &'a S,
    name: &'static str,
    completed: Vec<(&'static str, Undo)>,
}

impl<'a, S: TableStore> Saga<'a, S> {
    pub fn new(store: &'a S, name: &'static str) -> Self {
        Self {
            store,
            name,
            completed: Vec::new(),
        }
    }

    /// Run `action`. On success its `undo` operations are registered; on failure every
    /// earlier step is compensated and the action's error is returned unchanged.
    pub async fn step<T, F>(
        &mut self,
        label: &'static str,
        action: F,
        undo: impl IntoIterator<Item = Undo>,
    ) -> Result<T, TableError>
    where
        F: Future<Output = Result<T, TableError>>,
    {
        match action.await {
            Ok(value) => {
                self.completed.extend(undo.into_iter().map(|u| (label, u)));
                Ok(value)
            }
            Err(e) => {
                warn!(saga = self.name, step = label, error = %e, "saga step failed");
                self.unwind().await;
                Err(e)
            }
        }
    }

    /// Compensate every completed step, newest first. A failed compensation does not stop
    /// the ones after it. Deleting an already absent row counts as compensated.
    pub async fn unwind(&mut self) -> Vec<CleanupOutcome> {
        let mut outcomes = Vec::with_capacity(self.completed.len());
        while let Some((label, undo)) = self.completed.pop() {
            let result = match self.store.execute(&undo.table, &undo.operation).await {
                Err(TableError::NotFound) => Ok(()),
                other => other,
            };
            if let Err(e) = &result {
                warn!(
                    saga = self.name,
                    step = label,
                    table = %undo.table,
                    partition_key = undo.operation.partition_key(),
                    error = %e,
                    "compensation failed"
                );
            }
            outcomes.push(CleanupOutcome::of(label, result));
        }
        if !outcomes.is_empty() {
            info!(
                saga = self.name,
                compensated = outcomes.iter().filter(|o| o.is_ok()).count(),
                failed = outcomes.iter().filter(|o| !o.is_ok()).count(),
                "saga unwound"
            );
        }
        outcomes
    }

    /// Commit: drop the registered compensations.
    pub fn finish(self) {}
}
