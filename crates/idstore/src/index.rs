use tracing::debug;

use idstore_domain::id::IdentityId;
use idstore_domain::key::encode_key;
use idstore_table::{TableError, TableOperation, TableStore};

use crate::records::{INDEX_ROW_KEY, index_entry, index_owner};

/// A unique-key index table: alternate key → owning identity id.
///
/// Uniqueness rests entirely on the store's conditional insert. Nothing checks that the
/// owner still exists.
pub struct UniqueKeyIndex<'a, S> {
    store: &'a S,
    table: &'a str,
}

impl<S> Clone for UniqueKeyIndex<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for UniqueKeyIndex<'_, S> {}

impl<'a, S: TableStore> UniqueKeyIndex<'a, S> {
    pub fn new(store: &'a S, table: &'a str) -> Self {
        Self { store, table }
    }

    pub fn table(&self) -> &'a str {
        self.table
    }

    /// Conditional insert. Fails with `TableError::Conflict` if the key is taken.
    pub async fn claim(&self, key: &str, owner: IdentityId) -> Result<(), TableError> {
        let op = TableOperation::Insert(index_entry(key, owner));
        self.store.execute(self.table, &op).await
    }

    /// Unconditional insert-or-replace.
    pub async fn put(&self, key: &str, owner: IdentityId) -> Result<(), TableError> {
        let op = TableOperation::InsertOrReplace(index_entry(key, owner));
        self.store.execute(self.table, &op).await
    }

    pub async fn owner_of(&self, key: &str) -> Result<Option<IdentityId>, TableError> {
        let encoded = encode_key(key);
        debug!(table = self.table, key = %encoded, "index lookup");
        self.store
            .retrieve(self.table, &encoded, INDEX_ROW_KEY)
            .await?
            .map(|entity| index_owner(&entity))
            .transpose()
    }

    pub async fn release(&self, key: &str) -> Result<(), TableError> {
        let op = TableOperation::delete(encode_key(key), INDEX_ROW_KEY);
        self.store.execute(self.table, &op).await
    }

    /// Delete the entry only while it still points at `owner`.
    ///
    /// Returns whether an entry was removed. A missing entry is not an error.
    pub async fn release_if_owned(&self, key: &str, owner: IdentityId) -> Result<bool, TableError> {
        match self.owner_of(key).await? {
            Some(current) if current == owner => match self.release(key).await {
                Ok(()) => Ok(true),
                Err(TableError::NotFound) => Ok(false),
                Err(e) => Err(e),
            },
            _ => Ok(false),
        }
    }
}
