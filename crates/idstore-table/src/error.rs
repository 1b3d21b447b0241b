/// Errors surfaced by a table store backend.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Conditional insert found an existing row with the same key.
    #[error("entity already exists")]
    Conflict,
    #[error("entity not found")]
    NotFound,
    #[error("table not found: {0}")]
    TableNotFound(String),
    /// The store refused the request as malformed (bad key, out-of-range value, oversize batch).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An atomic batch was rejected as a whole because of the operation at `index`.
    #[error("batch rejected at operation {index}: {source}")]
    BatchRejected {
        index: usize,
        source: Box<TableError>,
    },
    #[error("malformed entity: {0}")]
    MalformedEntity(String),
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

impl TableError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::TableNotFound(_) => "TABLE_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::BatchRejected { .. } => "BATCH_REJECTED",
            Self::MalformedEntity(_) => "MALFORMED_ENTITY",
            Self::Transport(_) => "TRANSPORT",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
