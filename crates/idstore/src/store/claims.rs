use tracing::debug;

use idstore_domain::id::IdentityId;
use idstore_domain::identity::Claim;
use idstore_domain::key::encode_key;
use idstore_table::{TableOperation, TableStore};

use super::{IdentityStore, require};
use crate::batch::BatchReport;
use crate::error::StoreError;
use crate::records::{claim_from_entity, claim_to_entity, owner_key};
use crate::scanner::SegmentedScanner;

impl<S: TableStore> IdentityStore<S> {
    /// One claim per type per identity; a second claim of the same type conflicts.
    pub async fn add_claim(&self, owner: IdentityId, claim: &Claim) -> Result<(), StoreError> {
        require("claim type", &claim.claim_type)?;
        let op = TableOperation::Insert(claim_to_entity(owner, claim));
        self.tables().execute(&self.config().claims_table, &op).await?;
        debug!(identity_id = %owner, claim_type = %claim.claim_type, "claim added");
        Ok(())
    }

    pub async fn remove_claim(&self, owner: IdentityId, claim: &Claim) -> Result<(), StoreError> {
        require("claim type", &claim.claim_type)?;
        let op = TableOperation::delete(owner_key(owner), encode_key(&claim.claim_type));
        self.tables().execute(&self.config().claims_table, &op).await?;
        Ok(())
    }

    pub async fn remove_all_claims(&self, owner: IdentityId) -> Result<BatchReport, StoreError> {
        self.remove_partition(&self.config().claims_table, owner).await
    }

    pub async fn get_claims(&self, owner: IdentityId) -> Result<Vec<Claim>, StoreError> {
        let table = &self.config().claims_table;
        let rows = SegmentedScanner::partition(self.tables(), table, owner_key(owner))
            .collect_all()
            .await?;
        rows.iter()
            .map(|row| claim_from_entity(row).map_err(StoreError::from))
            .collect()
    }
}
