//! Mapping between domain records and table rows.
//!
//! Every table row is built by an explicit `*_to_entity` function and read back by a
//! matching `*_from_entity`. Fields the domain carries but the row does not (pending
//! logins, lazily loaded relations) are simply not mapped.

use idstore_domain::id::{IdentityId, RoleId};
use idstore_domain::identity::{Claim, Identity, LoginInfo, Role};
use idstore_domain::key::{LoginKey, encode_key};
use idstore_table::{TableEntity, TableError, clamp_datetime};

/// Row key of every unique-key index entry.
pub const INDEX_ROW_KEY: &str = "";

pub mod prop {
    pub const ID: &str = "Id";
    pub const USER_NAME: &str = "UserName";
    pub const EMAIL: &str = "Email";
    pub const EMAIL_CONFIRMED: &str = "EmailConfirmed";
    pub const PASSWORD_HASH: &str = "PasswordHash";
    pub const SECURITY_STAMP: &str = "SecurityStamp";
    pub const PHONE_NUMBER: &str = "PhoneNumber";
    pub const PHONE_NUMBER_CONFIRMED: &str = "PhoneNumberConfirmed";
    pub const TWO_FACTOR_ENABLED: &str = "TwoFactorEnabled";
    pub const LOCKOUT_END_DATE: &str = "LockoutEndDate";
    pub const LOCKOUT_ENABLED: &str = "LockoutEnabled";
    pub const ACCESS_FAILED_COUNT: &str = "AccessFailedCount";
    pub const USER_ID: &str = "UserId";
    pub const LOGIN_PROVIDER: &str = "LoginProvider";
    pub const PROVIDER_KEY: &str = "ProviderKey";
    pub const CLAIM_TYPE: &str = "ClaimType";
    pub const CLAIM_VALUE: &str = "ClaimValue";
    pub const NAME: &str = "Name";
}

/// Partition (and row) key of an identity's primary record and of its children.
pub fn owner_key(id: IdentityId) -> String {
    id.to_string()
}

// ── Primary record ───────────────────────────────────────────────────────────

/// Lockout end is raised to the store minimum here, so callers never hit the
/// store's lower bound.
pub fn identity_to_entity(identity: &Identity) -> TableEntity {
    let key = owner_key(identity.id);
    TableEntity::new(key.clone(), key)
        .with(prop::ID, identity.id.0)
        .with(prop::USER_NAME, identity.username.as_str())
        .with_opt(prop::EMAIL, identity.email.as_deref())
        .with(prop::EMAIL_CONFIRMED, identity.email_confirmed)
        .with_opt(prop::PASSWORD_HASH, identity.password_hash.as_deref())
        .with_opt(prop::SECURITY_STAMP, identity.security_stamp.as_deref())
        .with_opt(prop::PHONE_NUMBER, identity.phone_number.as_deref())
        .with(prop::PHONE_NUMBER_CONFIRMED, identity.phone_number_confirmed)
        .with(prop::TWO_FACTOR_ENABLED, identity.two_factor_enabled)
        .with_opt(prop::LOCKOUT_END_DATE, identity.lockout_end.map(clamp_datetime))
        .with(prop::LOCKOUT_ENABLED, identity.lockout_enabled)
        .with(prop::ACCESS_FAILED_COUNT, identity.access_failed_count)
}

pub fn identity_from_entity(entity: &TableEntity) -> Result<Identity, TableError> {
    let id = IdentityId(entity.get_guid(prop::ID)?);
    let access_failed_count = u32::try_from(entity.get_int(prop::ACCESS_FAILED_COUNT)?)
        .map_err(|_| {
            TableError::MalformedEntity(format!("{} out of range", prop::ACCESS_FAILED_COUNT))
        })?;
    let mut identity = Identity::with_id(id, entity.get_str(prop::USER_NAME)?);
    identity.email = owned(entity.get_opt_str(prop::EMAIL)?);
    identity.email_confirmed = entity.get_bool(prop::EMAIL_CONFIRMED)?;
    identity.password_hash = owned(entity.get_opt_str(prop::PASSWORD_HASH)?);
    identity.security_stamp = owned(entity.get_opt_str(prop::SECURITY_STAMP)?);
    identity.phone_number = owned(entity.get_opt_str(prop::PHONE_NUMBER)?);
    identity.phone_number_confirmed = entity.get_bool(prop::PHONE_NUMBER_CONFIRMED)?;
    identity.two_factor_enabled = entity.get_bool(prop::TWO_FACTOR_ENABLED)?;
    identity.lockout_end = entity.get_opt_datetime(prop::LOCKOUT_END_DATE)?;
    identity.lockout_enabled = entity.get_bool(prop::LOCKOUT_ENABLED)?;
    identity.access_failed_count = access_failed_count;
    Ok(identity)
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_owned)
}

// ── Unique-key index entries ─────────────────────────────────────────────────

pub fn index_entry(key: &str, owner: IdentityId) -> TableEntity {
    TableEntity::new(encode_key(key), INDEX_ROW_KEY).with(prop::USER_ID, owner.0)
}

pub fn index_owner(entity: &TableEntity) -> Result<IdentityId, TableError> {
    entity.get_guid(prop::USER_ID).map(IdentityId)
}

// ── Logins ───────────────────────────────────────────────────────────────────

pub fn login_to_entity(owner: IdentityId, login: &LoginInfo) -> TableEntity {
    TableEntity::new(owner_key(owner), LoginKey::from(login).encode())
        .with(prop::USER_ID, owner.0)
        .with(prop::LOGIN_PROVIDER, login.provider.as_str())
        .with(prop::PROVIDER_KEY, login.provider_key.as_str())
}

pub fn login_from_entity(entity: &TableEntity) -> Result<LoginInfo, TableError> {
    Ok(LoginInfo::new(
        entity.get_str(prop::LOGIN_PROVIDER)?,
        entity.get_str(prop::PROVIDER_KEY)?,
    ))
}

/// Provider-key index entry. Each login lands in its own partition.
pub fn login_index_entity(owner: IdentityId, login: &LoginInfo) -> TableEntity {
    TableEntity::new(LoginKey::from(login).encode(), INDEX_ROW_KEY)
        .with(prop::USER_ID, owner.0)
        .with(prop::LOGIN_PROVIDER, login.provider.as_str())
        .with(prop::PROVIDER_KEY, login.provider_key.as_str())
}

// ── Claims ───────────────────────────────────────────────────────────────────

pub fn claim_to_entity(owner: IdentityId, claim: &Claim) -> TableEntity {
    TableEntity::new(owner_key(owner), encode_key(&claim.claim_type))
        .with(prop::USER_ID, owner.0)
        .with(prop::CLAIM_TYPE, claim.claim_type.as_str())
        .with(prop::CLAIM_VALUE, claim.value.as_str())
}

pub fn claim_from_entity(entity: &TableEntity) -> Result<Claim, TableError> {
    Ok(Claim::new(
        entity.get_str(prop::CLAIM_TYPE)?,
        entity.get_str(prop::CLAIM_VALUE)?,
    ))
}

// ── Roles ────────────────────────────────────────────────────────────────────

pub fn role_to_entity(owner: IdentityId, role: &Role) -> TableEntity {
    TableEntity::new(owner_key(owner), encode_key(&role.name))
        .with(prop::USER_ID, owner.0)
        .with(prop::ID, role.id.0)
        .with(prop::NAME, role.name.as_str())
}

pub fn role_from_entity(entity: &TableEntity) -> Result<Role, TableError> {
    Ok(Role {
        id: RoleId(entity.get_guid(prop::ID)?),
        name: entity.get_str(prop::NAME)?.to_owned(),
    })
}
