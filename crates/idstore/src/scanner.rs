use tracing::debug;

use idstore_table::{ContinuationToken, TableEntity, TableError, TableQuery, TableStore};

/// Follows continuation tokens until a query is exhausted.
///
/// Each call to [`next_segment`](Self::next_segment) issues exactly one request, so callers
/// can process a large partition page by page instead of holding it all in memory.
pub struct SegmentedScanner<'a, S> {
    store: &'a S,
    table: &'a str,
    query: TableQuery,
    continuation: Option<ContinuationToken>,
    done: bool,
}

impl<'a, S: TableStore> SegmentedScanner<'a, S> {
    pub fn new(store: &'a S, table: &'a str, query: TableQuery) -> Self {
        Self {
            store,
            table,
            query,
            continuation: None,
            done: false,
        }
    }

    /// All rows of one partition.
    pub fn partition(store: &'a S, table: &'a str, partition_key: impl Into<String>) -> Self {
        Self::new(store, table, TableQuery::partition(partition_key))
    }

    /// Next page of rows, or `None` once the query is exhausted. A page may be empty
    /// while more pages follow.
    pub async fn next_segment(&mut self) -> Result<Option<Vec<TableEntity>>, TableError> {
        if self.done {
            return Ok(None);
        }
        let segment = self
            .store
            .query_segment(self.table, &self.query, self.continuation.as_ref())
            .await?;
        debug!(
            table = self.table,
            rows = segment.results.len(),
            more = segment.continuation.is_some(),
            "scanned segment"
        );
        self.done = segment.continuation.is_none();
        self.continuation = segment.continuation;
        Ok(Some(segment.results))
    }

    pub async fn collect_all(mut self) -> Result<Vec<TableEntity>, TableError> {
        let mut rows = Vec::new();
        while let Some(page) = self.next_segment().await? {
            rows.extend(page);
        }
        Ok(rows)
    }
}
