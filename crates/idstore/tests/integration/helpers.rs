use std::sync::Arc;

use idstore::{IdentityStore, StoreConfig};
use idstore_table::memory::MemoryTableStore;
use idstore_testing::fault::FaultyTableStore;
use idstore_testing::fixture;

pub type Tables = FaultyTableStore<MemoryTableStore>;

pub const USERS: &str = "users";
pub const USERNAME_INDEX: &str = "userIndexItems";
pub const EMAIL_INDEX: &str = "userEmailIndex";
pub const LOGINS: &str = "logins";
pub const LOGIN_INDEX: &str = "loginProviderKeyIndex";
pub const CLAIMS: &str = "claims";
pub const ROLES: &str = "roles";

/// Store over a fault-injecting in-memory backend, with every table created.
pub async fn store() -> IdentityStore<Tables> {
    store_with_page_size(1000).await
}

pub async fn store_with_page_size(page_size: usize) -> IdentityStore<Tables> {
    store_with_config(page_size, StoreConfig::default()).await
}

pub async fn store_with_config(page_size: usize, config: StoreConfig) -> IdentityStore<Tables> {
    fixture::setup();
    let tables = Arc::new(FaultyTableStore::new(MemoryTableStore::with_page_size(
        page_size,
    )));
    let store = IdentityStore::new(tables, config);
    store.ensure_tables().await.unwrap();
    store
}

pub fn rows(store: &IdentityStore<Tables>, table: &str) -> usize {
    store.tables().inner().row_count(table)
}
