use std::ops::{Deref, DerefMut};

use tokio::sync::OnceCell;

use idstore_domain::id::IdentityId;
use idstore_domain::identity::{Claim, Identity, LoginInfo, Role};
use idstore_table::TableStore;

use crate::error::StoreError;
use crate::store::IdentityStore;

/// Lazily loaded child records of one identity.
///
/// Each relation is fetched on first access with a partition scan and cached for the
/// life of this value.
pub struct Relations<S> {
    store: IdentityStore<S>,
    owner: IdentityId,
    roles: OnceCell<Vec<Role>>,
    claims: OnceCell<Vec<Claim>>,
    logins: OnceCell<Vec<LoginInfo>>,
}

impl<S: TableStore> Relations<S> {
    pub fn new(store: IdentityStore<S>, owner: IdentityId) -> Self {
        Self {
            store,
            owner,
            roles: OnceCell::new(),
            claims: OnceCell::new(),
            logins: OnceCell::new(),
        }
    }

    pub async fn roles(&self) -> Result<&[Role], StoreError> {
        self.roles
            .get_or_try_init(|| self.store.get_roles(self.owner))
            .await
            .map(Vec::as_slice)
    }

    pub async fn claims(&self) -> Result<&[Claim], StoreError> {
        self.claims
            .get_or_try_init(|| self.store.get_claims(self.owner))
            .await
            .map(Vec::as_slice)
    }

    pub async fn logins(&self) -> Result<&[LoginInfo], StoreError> {
        self.logins
            .get_or_try_init(|| self.store.get_logins(self.owner))
            .await
            .map(Vec::as_slice)
    }

    /// Drop cached relations so the next access reloads them.
    pub fn forget(&mut self) {
        self.roles.take();
        self.claims.take();
        self.logins.take();
    }
}

/// An identity read from the store, with its relations attached.
pub struct LoadedIdentity<S> {
    identity: Identity,
    relations: Relations<S>,
}

impl<S> std::fmt::Debug for LoadedIdentity<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedIdentity")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl<S: TableStore> LoadedIdentity<S> {
    pub(crate) fn new(store: IdentityStore<S>, identity: Identity) -> Self {
        let relations = Relations::new(store, identity.id);
        Self {
            identity,
            relations,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn into_identity(self) -> Identity {
        self.identity
    }

    pub fn relations(&self) -> &Relations<S> {
        &self.relations
    }

    pub fn relations_mut(&mut self) -> &mut Relations<S> {
        &mut self.relations
    }

    pub async fn roles(&self) -> Result<&[Role], StoreError> {
        self.relations.roles().await
    }

    pub async fn claims(&self) -> Result<&[Claim], StoreError> {
        self.relations.claims().await
    }

    pub async fn logins(&self) -> Result<&[LoginInfo], StoreError> {
        self.relations.logins().await
    }
}

impl<S> Deref for LoadedIdentity<S> {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.identity
    }
}

impl<S> DerefMut for LoadedIdentity<S> {
    fn deref_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }
}
