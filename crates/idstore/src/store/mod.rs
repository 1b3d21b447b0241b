//! The identity store: primary records, their unique-key indexes and child records.

mod claims;
mod logins;
mod roles;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use idstore_domain::id::IdentityId;
use idstore_domain::identity::{Identity, LoginInfo};
use idstore_domain::key::{LoginKey, encode_key};
use idstore_table::{MAX_BATCH_SIZE, TableError, TableOperation, TableStore};

use crate::batch::{BatchExecutor, BatchReport};
use crate::config::StoreConfig;
use crate::error::{IdentifierKind, StoreError};
use crate::index::UniqueKeyIndex;
use crate::index_builder::IndexBuilder;
use crate::records::{
    INDEX_ROW_KEY, identity_from_entity, identity_to_entity, index_owner, login_index_entity,
    login_to_entity, owner_key,
};
use crate::relations::LoadedIdentity;
use crate::saga::{CleanupOutcome, Saga, Undo};
use crate::scanner::SegmentedScanner;

/// Outcomes of the cleanup passes that follow a delete.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub outcomes: Vec<CleanupOutcome>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(CleanupOutcome::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CleanupOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }
}

/// Identity persistence over a [`TableStore`].
///
/// Cheap to clone; clones share the backend and configuration.
pub struct IdentityStore<S> {
    tables: Arc<S>,
    config: Arc<StoreConfig>,
}

impl<S> Clone for IdentityStore<S> {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: TableStore> IdentityStore<S> {
    pub fn new(tables: Arc<S>, config: StoreConfig) -> Self {
        Self {
            tables,
            config: Arc::new(config),
        }
    }

    pub fn tables(&self) -> &S {
        &self.tables
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create every table the store uses, unless disabled by `create_tables`.
    pub async fn ensure_tables(&self) -> Result<(), StoreError> {
        if !self.config.create_tables {
            debug!("table creation disabled");
            return Ok(());
        }
        for table in self.config.table_names() {
            self.tables.create_table_if_not_exists(table).await?;
        }
        info!("tables ensured");
        Ok(())
    }

    pub fn index_builder(&self) -> IndexBuilder<S> {
        IndexBuilder::new(self.clone())
    }

    fn username_index(&self) -> UniqueKeyIndex<'_, S> {
        UniqueKeyIndex::new(&*self.tables, &self.config.username_index_table)
    }

    fn email_index(&self) -> UniqueKeyIndex<'_, S> {
        UniqueKeyIndex::new(&*self.tables, &self.config.email_index_table)
    }

    // ── Create / update / delete ─────────────────────────────────────────────

    /// Persist a new identity together with its index entries and any pending logins.
    ///
    /// The username and email indexes are claimed with conditional inserts before anything
    /// else is written. When a later write fails, everything already written is undone.
    /// Pending logins repeating a (provider, key) pair are written once.
    pub async fn create(&self, identity: &Identity) -> Result<(), StoreError> {
        require("username", &identity.username)?;
        for login in &identity.logins {
            validate_login(login)?;
        }
        let logins = distinct_logins(&identity.logins);

        let cfg = &*self.config;
        let id = identity.id;
        let mut saga = Saga::new(&*self.tables, "create_identity");

        saga.step(
            "claim username",
            self.username_index().claim(&identity.username, id),
            [Undo::delete(
                &cfg.username_index_table,
                encode_key(&identity.username),
                INDEX_ROW_KEY,
            )],
        )
        .await
        .map_err(|e| duplicate_or(e, IdentifierKind::Username))?;

        if let Some(email) = identity.email_key() {
            saga.step(
                "claim email",
                self.email_index().claim(email, id),
                [Undo::delete(
                    &cfg.email_index_table,
                    encode_key(email),
                    INDEX_ROW_KEY,
                )],
            )
            .await
            .map_err(|e| duplicate_or(e, IdentifierKind::Email))?;
        }

        let record = identity_to_entity(identity);
        let undo_record = Undo::delete(&cfg.users_table, &record.partition_key, &record.row_key);
        saga.step(
            "write primary record",
            self.tables
                .execute(&cfg.users_table, &TableOperation::InsertOrReplace(record)),
            [undo_record],
        )
        .await?;

        if !logins.is_empty() {
            let rows: Vec<_> = logins
                .iter()
                .map(|login| login_to_entity(id, login))
                .collect();
            for chunk in rows.chunks(MAX_BATCH_SIZE) {
                let undo: Vec<_> = chunk
                    .iter()
                    .map(|row| Undo::delete(&cfg.logins_table, &row.partition_key, &row.row_key))
                    .collect();
                let ops: Vec<_> = chunk
                    .iter()
                    .cloned()
                    .map(TableOperation::InsertOrReplace)
                    .collect();
                saga.step(
                    "write logins",
                    self.tables.execute_batch(&cfg.logins_table, &ops),
                    undo,
                )
                .await?;
            }

            // Provider-key entries live in separate partitions, one write each.
            for login in &logins {
                let entry = login_index_entity(id, login);
                let undo = Undo::delete(&cfg.login_index_table, &entry.partition_key, INDEX_ROW_KEY);
                saga.step(
                    "index login",
                    self.tables.execute(
                        &cfg.login_index_table,
                        &TableOperation::InsertOrReplace(entry),
                    ),
                    [undo],
                )
                .await?;
            }
        }

        saga.finish();
        info!(identity_id = %id, logins = logins.len(), "identity created");
        Ok(())
    }

    /// Overwrite the persisted fields of an existing identity.
    ///
    /// Last writer wins. The username is treated as immutable, so indexes are untouched.
    /// Updating an identity that is not stored fails with `NotFound`.
    pub async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        require("username", &identity.username)?;
        let op = TableOperation::Replace(identity_to_entity(identity));
        self.tables.execute(&self.config.users_table, &op).await?;
        debug!(identity_id = %identity.id, "identity updated");
        Ok(())
    }

    /// Remove the primary record, then clean up roles, claims, logins and index entries.
    ///
    /// Only the primary record delete can fail the call. The cleanup passes run
    /// concurrently; their failures are logged and returned in the report.
    pub async fn delete(&self, identity: &Identity) -> Result<CleanupReport, StoreError> {
        let key = owner_key(identity.id);
        self.tables
            .execute(&self.config.users_table, &TableOperation::delete(&key, &key))
            .await?;
        info!(identity_id = %identity.id, "identity deleted");

        let (roles, claims, logins, indexes) = tokio::join!(
            self.remove_from_all_roles(identity.id),
            self.remove_all_claims(identity.id),
            self.remove_all_logins(identity.id),
            self.release_identifiers(identity),
        );
        let report = CleanupReport {
            outcomes: vec![
                CleanupOutcome::of("roles", roles),
                CleanupOutcome::of("claims", claims),
                CleanupOutcome::of("logins", logins),
                CleanupOutcome::of("indexes", indexes),
            ],
        };
        for failure in report.failures() {
            if let Some(error) = &failure.error {
                warn!(
                    identity_id = %identity.id,
                    pass = failure.label,
                    error = %error,
                    "cleanup after delete failed"
                );
            }
        }
        Ok(report)
    }

    /// Remove the username and email entries that still point at this identity.
    async fn release_identifiers(&self, identity: &Identity) -> Result<(), TableError> {
        let username = self
            .username_index()
            .release_if_owned(&identity.username, identity.id)
            .await;
        let email = match identity.email_key() {
            Some(email) => self.email_index().release_if_owned(email, identity.id).await,
            None => Ok(false),
        };
        username.and(email).map(|_| ())
    }

    // ── Lookups ──────────────────────────────────────────────────────────────

    pub async fn find_by_id(&self, id: IdentityId) -> Result<Option<LoadedIdentity<S>>, StoreError> {
        let key = owner_key(id);
        debug!(identity_id = %id, "find by id");
        let Some(entity) = self
            .tables
            .retrieve(&self.config.users_table, &key, &key)
            .await?
        else {
            return Ok(None);
        };
        let identity = identity_from_entity(&entity)?;
        Ok(Some(LoadedIdentity::new(self.clone(), identity)))
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<LoadedIdentity<S>>, StoreError> {
        require("username", username)?;
        match self.username_index().owner_of(username).await? {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// A blank email never matches.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<LoadedIdentity<S>>, StoreError> {
        if email.trim().is_empty() {
            return Ok(None);
        }
        match self.email_index().owner_of(email).await? {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    pub async fn find_by_login(
        &self,
        login: &LoginInfo,
    ) -> Result<Option<LoadedIdentity<S>>, StoreError> {
        validate_login(login)?;
        let key = LoginKey::from(login).encode();
        let entry = self
            .tables
            .retrieve(&self.config.login_index_table, &key, INDEX_ROW_KEY)
            .await?;
        match entry {
            Some(entity) => self.find_by_id(index_owner(&entity)?).await,
            None => Ok(None),
        }
    }

    /// Delete every row of `owner`'s partition in `table`, page by page.
    async fn remove_partition(
        &self,
        table: &str,
        owner: IdentityId,
    ) -> Result<BatchReport, StoreError> {
        let mut scanner = SegmentedScanner::partition(&*self.tables, table, owner_key(owner));
        let mut executor = BatchExecutor::new(&*self.tables, table, self.config.batch_ceiling());
        while let Some(page) = scanner.next_segment().await? {
            for row in page {
                executor
                    .push(TableOperation::delete(row.partition_key, row.row_key))
                    .await;
            }
        }
        let report = executor.finish().await;
        debug!(table, identity_id = %owner, removed = report.attempted, "partition cleared");
        report.into_result()
    }
}

fn require(name: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(name));
    }
    Ok(())
}

fn validate_login(login: &LoginInfo) -> Result<(), StoreError> {
    require("login provider", &login.provider)?;
    require("provider key", &login.provider_key)
}

/// First occurrence of each (provider, key) pair, in order.
fn distinct_logins(logins: &[LoginInfo]) -> Vec<&LoginInfo> {
    let mut seen = HashSet::new();
    logins
        .iter()
        .filter(|login| seen.insert(LoginKey::from(*login).encode()))
        .collect()
}

fn duplicate_or(error: TableError, kind: IdentifierKind) -> StoreError {
    match error {
        TableError::Conflict => StoreError::DuplicateIdentifier(kind),
        other => StoreError::Table(other),
    }
}
