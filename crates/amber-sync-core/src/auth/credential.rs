use std::fmt;

/// Environment variable the host can use to hand over its credential.
pub const CREDENTIAL_ENV: &str = "AMBER_INIT_DATA";

/// Opaque credential supplied by the hosting environment.
///
/// The value is forwarded verbatim and never logged; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read the credential from `AMBER_INIT_DATA`, ignoring blank values.
    pub fn from_env() -> Option<Self> {
        std::env::var(CREDENTIAL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self)
    }

    /// The raw value, for building the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted, {} bytes>)", self.0.len())
    }
}
