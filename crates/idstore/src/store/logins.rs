use tracing::{debug, info, warn};

use idstore_domain::id::IdentityId;
use idstore_domain::identity::LoginInfo;
use idstore_domain::key::LoginKey;
use idstore_table::{TableError, TableOperation, TableStore};

use super::{IdentityStore, validate_login};
use crate::batch::{BatchExecutor, BatchReport};
use crate::error::StoreError;
use crate::records::{
    INDEX_ROW_KEY, login_from_entity, login_index_entity, login_to_entity, owner_key,
};
use crate::scanner::SegmentedScanner;

impl<S: TableStore> IdentityStore<S> {
    /// Attach an external login. Fails with `Conflict` if the identity already has it.
    pub async fn add_login(&self, owner: IdentityId, login: &LoginInfo) -> Result<(), StoreError> {
        validate_login(login)?;
        let cfg = self.config();
        self.tables()
            .execute(
                &cfg.logins_table,
                &TableOperation::Insert(login_to_entity(owner, login)),
            )
            .await?;
        self.tables()
            .execute(
                &cfg.login_index_table,
                &TableOperation::InsertOrReplace(login_index_entity(owner, login)),
            )
            .await?;
        debug!(identity_id = %owner, provider = %login.provider, "login added");
        Ok(())
    }

    /// Detach an external login. The index entry goes first, so an interrupted call can be
    /// retried; a missing login row still fails with `NotFound`.
    pub async fn remove_login(&self, owner: IdentityId, login: &LoginInfo) -> Result<(), StoreError> {
        validate_login(login)?;
        let cfg = self.config();
        let key = LoginKey::from(login).encode();
        match self
            .tables()
            .execute(&cfg.login_index_table, &TableOperation::delete(&key, INDEX_ROW_KEY))
            .await
        {
            Ok(()) | Err(TableError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        self.tables()
            .execute(&cfg.logins_table, &TableOperation::delete(owner_key(owner), key))
            .await?;
        debug!(identity_id = %owner, provider = %login.provider, "login removed");
        Ok(())
    }

    /// Delete every login of `owner` along with its provider-key index entry.
    ///
    /// Each index entry is removed before its login row is queued, so whatever an
    /// interrupted run leaves behind is still reachable from the login partition. A row
    /// whose index entry could not be removed is kept for the next attempt.
    pub async fn remove_all_logins(&self, owner: IdentityId) -> Result<BatchReport, StoreError> {
        let cfg = self.config();
        let mut scanner =
            SegmentedScanner::partition(self.tables(), &cfg.logins_table, owner_key(owner));
        let mut rows = BatchExecutor::new(self.tables(), &cfg.logins_table, cfg.batch_ceiling());
        let mut indexes = BatchReport::default();
        while let Some(page) = scanner.next_segment().await? {
            for row in page {
                indexes.attempted += 1;
                let entry = TableOperation::delete(row.row_key.clone(), INDEX_ROW_KEY);
                match self.tables().execute(&cfg.login_index_table, &entry).await {
                    Ok(()) | Err(TableError::NotFound) => {}
                    Err(e) => {
                        warn!(
                            identity_id = %owner,
                            login = %row.row_key,
                            error = %e,
                            "login index entry not removed, keeping login row"
                        );
                        indexes.failed += 1;
                        continue;
                    }
                }
                rows.push(TableOperation::delete(row.partition_key, row.row_key)).await;
            }
        }
        let mut report = rows.finish().await;
        report.merge(indexes);
        info!(identity_id = %owner, logins = indexes.attempted, "logins removed");
        report.into_result()
    }

    /// Every login attached to `owner`.
    pub async fn get_logins(&self, owner: IdentityId) -> Result<Vec<LoginInfo>, StoreError> {
        let table = &self.config().logins_table;
        let rows = SegmentedScanner::partition(self.tables(), table, owner_key(owner))
            .collect_all()
            .await?;
        rows.iter()
            .map(|row| login_from_entity(row).map_err(StoreError::from))
            .collect()
    }
}
