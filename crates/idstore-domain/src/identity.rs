//! The identity aggregate and its child facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{IdentityId, RoleId};

/// Canonical user identity: profile, credentials and lockout bookkeeping.
///
/// Credential fields are opaque to the store; hashing and stamp generation happen elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    /// Assumed immutable after creation; the username index is not maintained on update.
    pub username: String,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    pub security_stamp: Option<String>,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub two_factor_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: u32,
    /// External logins written alongside the identity on create. Not part of the primary record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logins: Vec<LoginInfo>,
}

impl Identity {
    /// New identity with a freshly allocated id.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_id(IdentityId::new(), username)
    }

    pub fn with_id(id: IdentityId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            email_confirmed: false,
            password_hash: None,
            security_stamp: None,
            phone_number: None,
            phone_number_confirmed: false,
            two_factor_enabled: false,
            lockout_end: None,
            lockout_enabled: false,
            access_failed_count: 0,
            logins: Vec::new(),
        }
    }

    /// Email if present and not blank.
    pub fn email_key(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn set_lockout_end(&mut self, until: Option<DateTime<Utc>>) {
        self.lockout_end = until;
    }

    /// Returns the new count.
    pub fn increment_access_failed_count(&mut self) -> u32 {
        self.access_failed_count = self.access_failed_count.saturating_add(1);
        self.access_failed_count
    }

    pub fn reset_access_failed_count(&mut self) {
        self.access_failed_count = 0;
    }
}

/// An external login: (provider, provider-issued key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoginInfo {
    pub provider: String,
    pub provider_key: String,
}

impl LoginInfo {
    pub fn new(provider: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            provider_key: provider_key.into(),
        }
    }
}

/// A claim attached to an identity. At most one claim per type per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// A role membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}
