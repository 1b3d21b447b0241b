/// Trait for loading configuration from prefixed environment variables.
///
/// Implementors derive `serde::Deserialize` (with `#[serde(default)]` for optional
/// settings) and name their prefix. Variable names are matched case-insensitively
/// after the prefix is stripped, so `IDSTORE_USERS_TABLE` fills `users_table`.
pub trait Config: Sized + serde::de::DeserializeOwned {
    /// Prefix shared by every variable of this config, e.g. `IDSTORE_`.
    const ENV_PREFIX: &'static str;

    fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(Self::ENV_PREFIX).from_env()
    }

    /// Load from an explicit set of variables instead of the process environment.
    fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(Self::ENV_PREFIX).from_iter(vars)
    }
}
