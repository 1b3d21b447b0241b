use std::fmt;

use idstore_table::TableError;

/// Which alternate key collided on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Username,
    Email,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username => f.write_str("username"),
            Self::Email => f.write_str("email"),
        }
    }
}

/// Identity store error variants.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required argument was missing or blank. Raised before any I/O.
    #[error("missing required argument: {0}")]
    Validation(&'static str),
    #[error("duplicate {0}")]
    DuplicateIdentifier(IdentifierKind),
    /// Some bulk deletes failed even after per-row retry. The rest stay committed.
    #[error("{failed} of {attempted} bulk operations failed")]
    PartialBulkFailure { failed: usize, attempted: usize },
    #[error(transparent)]
    Table(#[from] TableError),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::DuplicateIdentifier(IdentifierKind::Username) => "DUPLICATE_USERNAME",
            Self::DuplicateIdentifier(IdentifierKind::Email) => "DUPLICATE_EMAIL",
            Self::PartialBulkFailure { .. } => "PARTIAL_BULK_FAILURE",
            Self::Table(e) => e.kind(),
        }
    }
}
