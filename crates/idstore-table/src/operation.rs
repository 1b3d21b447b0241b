use crate::entity::TableEntity;

/// A single-row write.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOperation {
    /// Insert; fails with `Conflict` if the key is taken. The store's only conditional primitive.
    Insert(TableEntity),
    /// Upsert, replacing every property of an existing row.
    InsertOrReplace(TableEntity),
    /// Overwrite an existing row unconditionally; fails with `NotFound` if absent.
    Replace(TableEntity),
    /// Delete regardless of the row's current version; fails with `NotFound` if absent.
    Delete {
        partition_key: String,
        row_key: String,
    },
}

impl TableOperation {
    pub fn delete(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self::Delete {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }

    pub fn partition_key(&self) -> &str {
        match self {
            Self::Insert(e) | Self::InsertOrReplace(e) | Self::Replace(e) => &e.partition_key,
            Self::Delete { partition_key, .. } => partition_key,
        }
    }

    pub fn row_key(&self) -> &str {
        match self {
            Self::Insert(e) | Self::InsertOrReplace(e) | Self::Replace(e) => &e.row_key,
            Self::Delete { row_key, .. } => row_key,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Insert(_) => OperationKind::Insert,
            Self::InsertOrReplace(_) => OperationKind::InsertOrReplace,
            Self::Replace(_) => OperationKind::Replace,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }
}

/// Every request shape the store accepts, for logging and fault targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    InsertOrReplace,
    Replace,
    Delete,
    Batch,
    Retrieve,
    Query,
}
