use tracing::debug;

use idstore_domain::id::{IdentityId, RoleId};
use idstore_domain::identity::Role;
use idstore_domain::key::encode_key;
use idstore_table::{TableOperation, TableStore};

use super::{IdentityStore, require};
use crate::batch::BatchReport;
use crate::error::StoreError;
use crate::records::{owner_key, role_from_entity, role_to_entity};
use crate::scanner::SegmentedScanner;

impl<S: TableStore> IdentityStore<S> {
    /// Add `owner` to `role` under a freshly allocated role id.
    pub async fn add_to_role(&self, owner: IdentityId, role: &str) -> Result<Role, StoreError> {
        require("role", role)?;
        let membership = Role {
            id: RoleId::new(),
            name: role.to_owned(),
        };
        let op = TableOperation::Insert(role_to_entity(owner, &membership));
        self.tables().execute(&self.config().roles_table, &op).await?;
        debug!(identity_id = %owner, role, "role added");
        Ok(membership)
    }

    pub async fn remove_from_role(&self, owner: IdentityId, role: &str) -> Result<(), StoreError> {
        require("role", role)?;
        let op = TableOperation::delete(owner_key(owner), encode_key(role));
        self.tables().execute(&self.config().roles_table, &op).await?;
        Ok(())
    }

    pub async fn remove_from_all_roles(&self, owner: IdentityId) -> Result<BatchReport, StoreError> {
        self.remove_partition(&self.config().roles_table, owner).await
    }

    pub async fn get_roles(&self, owner: IdentityId) -> Result<Vec<Role>, StoreError> {
        let table = &self.config().roles_table;
        let rows = SegmentedScanner::partition(self.tables(), table, owner_key(owner))
            .collect_all()
            .await?;
        rows.iter()
            .map(|row| role_from_entity(row).map_err(StoreError::from))
            .collect()
    }

    /// Point read on the membership row.
    pub async fn is_in_role(&self, owner: IdentityId, role: &str) -> Result<bool, StoreError> {
        require("role", role)?;
        let row = self
            .tables()
            .retrieve(&self.config().roles_table, &owner_key(owner), &encode_key(role))
            .await?;
        Ok(row.is_some())
    }
}
