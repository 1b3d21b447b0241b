//! Store-safe key encoding.
//!
//! Partition and row keys may not contain `/`, `\`, `#` or `?`. Arbitrary text is
//! encoded as standard padded base64 of its UTF-8 bytes with `/` swapped for `-`,
//! which keeps the mapping reversible since `-` is not in the standard alphabet.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::identity::LoginInfo;

/// Separates the provider and provider-key halves of a login key. Never produced by [`encode_key`].
const LOGIN_KEY_SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("invalid key encoding")]
    Encoding,
    #[error("decoded key is not valid UTF-8")]
    Utf8,
    #[error("malformed login key")]
    MalformedLoginKey,
}

pub fn encode_key(plain: &str) -> String {
    STANDARD.encode(plain.as_bytes()).replace('/', "-")
}

pub fn decode_key(encoded: &str) -> Result<String, KeyError> {
    let bytes = STANDARD
        .decode(encoded.replace('-', "/"))
        .map_err(|_| KeyError::Encoding)?;
    String::from_utf8(bytes).map_err(|_| KeyError::Utf8)
}

/// Composite key for an external login: `encode(provider)_encode(provider_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoginKey {
    pub provider: String,
    pub provider_key: String,
}

impl LoginKey {
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            encode_key(&self.provider),
            LOGIN_KEY_SEPARATOR,
            encode_key(&self.provider_key)
        )
    }

    pub fn parse(encoded: &str) -> Result<Self, KeyError> {
        let (provider, provider_key) = encoded
            .split_once(LOGIN_KEY_SEPARATOR)
            .ok_or(KeyError::MalformedLoginKey)?;
        Ok(Self {
            provider: decode_key(provider)?,
            provider_key: decode_key(provider_key)?,
        })
    }
}

impl From<&LoginInfo> for LoginKey {
    fn from(login: &LoginInfo) -> Self {
        Self {
            provider: login.provider.clone(),
            provider_key: login.provider_key.clone(),
        }
    }
}

impl From<LoginKey> for LoginInfo {
    fn from(key: LoginKey) -> Self {
        LoginInfo::new(key.provider, key.provider_key)
    }
}
