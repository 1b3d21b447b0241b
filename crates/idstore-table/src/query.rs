use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::entity::TableEntity;
use crate::error::TableError;

/// A range query over one table: the whole table, or one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    pub partition_key: Option<String>,
    /// Upper bound on rows per segment. The store may return fewer.
    pub take: Option<usize>,
}

impl TableQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn partition(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: Some(partition_key.into()),
            take: None,
        }
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    pub fn matches(&self, entity: &TableEntity) -> bool {
        self.partition_key
            .as_deref()
            .is_none_or(|pk| pk == entity.partition_key)
    }
}

/// Opaque cursor marking where the next segment of a query resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken {
    next_partition_key: String,
    next_row_key: String,
}

impl ContinuationToken {
    /// Resume at (and including) the row with this key.
    pub fn new(next_partition_key: impl Into<String>, next_row_key: impl Into<String>) -> Self {
        Self {
            next_partition_key: next_partition_key.into(),
            next_row_key: next_row_key.into(),
        }
    }

    pub fn next_partition_key(&self) -> &str {
        &self.next_partition_key
    }

    pub fn next_row_key(&self) -> &str {
        &self.next_row_key
    }

    /// URL-safe rendering for carrying the cursor across process boundaries.
    pub fn to_opaque(&self) -> String {
        let raw = format!(
            "{}:{}{}",
            self.next_partition_key.len(),
            self.next_partition_key,
            self.next_row_key
        );
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn from_opaque(opaque: &str) -> Result<Self, TableError> {
        let invalid = || TableError::InvalidInput("malformed continuation token".into());
        let bytes = URL_SAFE_NO_PAD.decode(opaque).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (len, rest) = raw.split_once(':').ok_or_else(invalid)?;
        let len: usize = len.parse().map_err(|_| invalid())?;
        let partition_key = rest.get(..len).ok_or_else(invalid)?;
        let row_key = rest.get(len..).ok_or_else(invalid)?;
        Ok(Self::new(partition_key, row_key))
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySegment {
    pub results: Vec<TableEntity>,
    /// `Some` while more rows may follow.
    pub continuation: Option<ContinuationToken>,
}
