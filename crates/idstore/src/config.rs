use serde::Deserialize;

use idstore_core::config::Config;
use idstore_table::MAX_BATCH_SIZE;

/// Identity store configuration, loaded from `IDSTORE_*` environment variables.
///
/// Every setting has a default, so an empty environment yields a working config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Primary records. Env var: `IDSTORE_USERS_TABLE`.
    pub users_table: String,
    /// Username → id index. Env var: `IDSTORE_USERNAME_INDEX_TABLE`.
    pub username_index_table: String,
    /// Email → id index. Env var: `IDSTORE_EMAIL_INDEX_TABLE`.
    pub email_index_table: String,
    pub logins_table: String,
    /// (provider, provider key) → id index. Env var: `IDSTORE_LOGIN_INDEX_TABLE`.
    pub login_index_table: String,
    pub claims_table: String,
    pub roles_table: String,
    /// Operations per atomic batch during bulk cleanup (default 100, capped at the store limit).
    pub batch_size: usize,
    /// Create missing tables in `IdentityStore::ensure_tables` (default true).
    pub create_tables: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            users_table: "users".to_owned(),
            username_index_table: "userIndexItems".to_owned(),
            email_index_table: "userEmailIndex".to_owned(),
            logins_table: "logins".to_owned(),
            login_index_table: "loginProviderKeyIndex".to_owned(),
            claims_table: "claims".to_owned(),
            roles_table: "roles".to_owned(),
            batch_size: MAX_BATCH_SIZE,
            create_tables: true,
        }
    }
}

impl Config for StoreConfig {
    const ENV_PREFIX: &'static str = "IDSTORE_";
}

impl StoreConfig {
    /// Batch size clamped to `1..=MAX_BATCH_SIZE`.
    pub fn batch_ceiling(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    pub fn table_names(&self) -> [&str; 7] {
        [
            &self.users_table,
            &self.username_index_table,
            &self.email_index_table,
            &self.logins_table,
            &self.login_index_table,
            &self.claims_table,
            &self.roles_table,
        ]
    }
}
