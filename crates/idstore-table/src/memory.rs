use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::MAX_BATCH_SIZE;
use crate::entity::{PropertyValue, TableEntity, min_datetime};
use crate::error::TableError;
use crate::operation::TableOperation;
use crate::port::TableStore;
use crate::query::{ContinuationToken, QuerySegment, TableQuery};

/// Rows per segment when a query does not ask for fewer.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

type RowKey = (String, String);
type Table = BTreeMap<RowKey, TableEntity>;

/// In-process table store. Rows are kept ordered by (partition key, row key).
pub struct MemoryTableStore {
    tables: Mutex<HashMap<String, Table>>,
    page_size: usize,
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            page_size: page_size.max(1),
        }
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().get(table).map_or(0, BTreeMap::len)
    }

    pub fn contains(&self, table: &str, partition_key: &str, row_key: &str) -> bool {
        self.lock().get(table).is_some_and(|rows| {
            rows.contains_key(&(partition_key.to_owned(), row_key.to_owned()))
        })
    }

    /// Snapshot of every row in `table`, in key order.
    pub fn rows(&self, table: &str) -> Vec<TableEntity> {
        self.lock()
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Table>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, Table>,
    name: &str,
) -> Result<&'a mut Table, TableError> {
    tables
        .get_mut(name)
        .ok_or_else(|| TableError::TableNotFound(name.to_owned()))
}

fn validate_key(key: &str) -> Result<(), TableError> {
    match key
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '#' | '?') || c.is_control())
    {
        Some(c) => Err(TableError::InvalidInput(format!(
            "character {c:?} is not allowed in keys"
        ))),
        None => Ok(()),
    }
}

fn validate_entity(entity: &TableEntity) -> Result<(), TableError> {
    validate_key(&entity.partition_key)?;
    validate_key(&entity.row_key)?;
    let min = min_datetime();
    for (name, value) in &entity.properties {
        if let PropertyValue::DateTime(dt) = value {
            if *dt < min {
                return Err(TableError::InvalidInput(format!(
                    "property {name} is before {min}"
                )));
            }
        }
    }
    Ok(())
}

fn apply(rows: &mut Table, operation: &TableOperation) -> Result<(), TableError> {
    let key = (
        operation.partition_key().to_owned(),
        operation.row_key().to_owned(),
    );
    match operation {
        TableOperation::Insert(entity) => {
            validate_entity(entity)?;
            if rows.contains_key(&key) {
                return Err(TableError::Conflict);
            }
            rows.insert(key, entity.clone());
        }
        TableOperation::InsertOrReplace(entity) => {
            validate_entity(entity)?;
            rows.insert(key, entity.clone());
        }
        TableOperation::Replace(entity) => {
            validate_entity(entity)?;
            let row = rows.get_mut(&key).ok_or(TableError::NotFound)?;
            *row = entity.clone();
        }
        TableOperation::Delete { .. } => {
            rows.remove(&key).ok_or(TableError::NotFound)?;
        }
    }
    Ok(())
}

fn validate_batch(operations: &[TableOperation]) -> Result<(), TableError> {
    let Some(first) = operations.first() else {
        return Err(TableError::InvalidInput("empty batch".into()));
    };
    if operations.len() > MAX_BATCH_SIZE {
        return Err(TableError::InvalidInput(format!(
            "batch of {} exceeds {MAX_BATCH_SIZE} operations",
            operations.len()
        )));
    }
    let partition = first.partition_key();
    let mut seen = HashSet::new();
    for op in operations {
        if op.partition_key() != partition {
            return Err(TableError::InvalidInput(
                "batch spans more than one partition".into(),
            ));
        }
        if !seen.insert(op.row_key()) {
            return Err(TableError::InvalidInput(format!(
                "row {:?} appears twice in batch",
                op.row_key()
            )));
        }
    }
    Ok(())
}

impl TableStore for MemoryTableStore {
    async fn create_table_if_not_exists(&self, table: &str) -> Result<(), TableError> {
        let mut tables = self.lock();
        if !tables.contains_key(table) {
            debug!(table, "table created");
            tables.insert(table.to_owned(), Table::new());
        }
        Ok(())
    }

    async fn execute(&self, table: &str, operation: &TableOperation) -> Result<(), TableError> {
        let mut tables = self.lock();
        apply(table_mut(&mut tables, table)?, operation)
    }

    async fn execute_batch(
        &self,
        table: &str,
        operations: &[TableOperation],
    ) -> Result<(), TableError> {
        validate_batch(operations)?;
        let mut tables = self.lock();
        let rows = table_mut(&mut tables, table)?;
        // Apply to a copy so a rejected batch leaves no trace.
        let mut staged = rows.clone();
        for (index, op) in operations.iter().enumerate() {
            if let Err(e) = apply(&mut staged, op) {
                trace!(table, index, error = %e, "batch rejected");
                return Err(TableError::BatchRejected {
                    index,
                    source: Box::new(e),
                });
            }
        }
        *rows = staged;
        Ok(())
    }

    async fn retrieve(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError> {
        let tables = self.lock();
        let rows = tables
            .get(table)
            .ok_or_else(|| TableError::TableNotFound(table.to_owned()))?;
        Ok(rows
            .get(&(partition_key.to_owned(), row_key.to_owned()))
            .cloned())
    }

    async fn query_segment(
        &self,
        table: &str,
        query: &TableQuery,
        continuation: Option<&ContinuationToken>,
    ) -> Result<QuerySegment, TableError> {
        let tables = self.lock();
        let rows = tables
            .get(table)
            .ok_or_else(|| TableError::TableNotFound(table.to_owned()))?;

        let start = match (continuation, &query.partition_key) {
            (Some(token), _) => Bound::Included((
                token.next_partition_key().to_owned(),
                token.next_row_key().to_owned(),
            )),
            (None, Some(pk)) => Bound::Included((pk.clone(), String::new())),
            (None, None) => Bound::Unbounded,
        };
        let limit = query
            .take
            .map_or(self.page_size, |take| take.min(self.page_size))
            .max(1);

        let mut matching = rows
            .range((start, Bound::Unbounded))
            .map(|(_, entity)| entity)
            .take_while(|entity| query.matches(entity));
        let results: Vec<TableEntity> = matching.by_ref().take(limit).cloned().collect();
        let continuation = matching
            .next()
            .map(|next| ContinuationToken::new(&next.partition_key, &next.row_key));

        Ok(QuerySegment {
            results,
            continuation,
        })
    }
}
