//! Identity fixtures.

use idstore_domain::identity::{Claim, Identity, LoginInfo};

/// Route store logs through the test harness. Safe to call from every test.
pub fn setup() {
    idstore_core::tracing::init_test_tracing();
}

/// Identity with only a username.
pub fn identity(username: &str) -> Identity {
    let mut identity = Identity::new(username);
    identity.password_hash = Some(format!("hash-of-{username}"));
    identity.security_stamp = Some("stamp".to_owned());
    identity
}

pub fn identity_with_email(username: &str, email: &str) -> Identity {
    let mut identity = identity(username);
    identity.email = Some(email.to_owned());
    identity
}

pub fn login(provider: &str, provider_key: &str) -> LoginInfo {
    LoginInfo::new(provider, provider_key)
}

pub fn claim(claim_type: &str, value: &str) -> Claim {
    Claim::new(claim_type, value)
}
