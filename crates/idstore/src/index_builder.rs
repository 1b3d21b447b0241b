//! Offline rebuild of the username index from the primary records.

use futures::future::join_all;
use tracing::{info, warn};

use idstore_domain::id::IdentityId;
use idstore_table::{MAX_BATCH_SIZE, TableQuery, TableStore};

use crate::error::StoreError;
use crate::index::UniqueKeyIndex;
use crate::records::identity_from_entity;
use crate::scanner::SegmentedScanner;
use crate::store::IdentityStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub scanned: usize,
    pub written: usize,
}

/// Rewrites one username index entry per stored identity.
///
/// Entries are insert-or-replaced, so the run can be repeated. Entries whose identity no
/// longer exists are left alone.
pub struct IndexBuilder<S> {
    store: IdentityStore<S>,
}

impl<S: TableStore> IndexBuilder<S> {
    pub fn new(store: IdentityStore<S>) -> Self {
        Self { store }
    }

    pub async fn build_indexes(&self) -> Result<RebuildReport, StoreError> {
        let cfg = self.store.config();
        let tables = self.store.tables();
        let index = UniqueKeyIndex::new(tables, &cfg.username_index_table);
        let mut scanner = SegmentedScanner::new(tables, &cfg.users_table, TableQuery::all());

        let mut report = RebuildReport::default();
        let mut pending = Vec::with_capacity(MAX_BATCH_SIZE);
        while let Some(page) = scanner.next_segment().await? {
            for row in page {
                report.scanned += 1;
                let identity = identity_from_entity(&row)?;
                if identity.username.trim().is_empty() {
                    warn!(identity_id = %identity.id, "identity without username skipped");
                    continue;
                }
                pending.push((identity.username, identity.id));
                if pending.len() == MAX_BATCH_SIZE {
                    report.written += write_entries(index, &mut pending).await?;
                }
            }
        }
        report.written += write_entries(index, &mut pending).await?;

        info!(scanned = report.scanned, written = report.written, "username index rebuilt");
        Ok(report)
    }
}

/// Write `pending` concurrently and drain it.
async fn write_entries<S: TableStore>(
    index: UniqueKeyIndex<'_, S>,
    pending: &mut Vec<(String, IdentityId)>,
) -> Result<usize, StoreError> {
    let writes = pending
        .drain(..)
        .map(|(username, id)| async move { index.put(&username, id).await });
    let results = join_all(writes).await;
    let written = results.len();
    results.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(written)
}
