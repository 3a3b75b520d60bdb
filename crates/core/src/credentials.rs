//! Account credentials
//!
//! B2 authenticates the initial handshake with an account id and an
//! application key sent as HTTP basic auth. Both can be supplied explicitly
//! or read from the `B2_ACCOUNT_ID` / `B2_APPLICATION_KEY` environment
//! variables.

use crate::error::{Error, Result};

/// Environment variable holding the account id
pub const ACCOUNT_ID_VAR: &str = "B2_ACCOUNT_ID";

/// Environment variable holding the application key
pub const APPLICATION_KEY_VAR: &str = "B2_APPLICATION_KEY";

/// Account credentials for the authorization handshake
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The B2 account id
    pub account_id: String,

    /// The application key for that account
    pub application_key: String,
}

impl Credentials {
    /// Create credentials from explicit values
    ///
    /// Fails with [`Error::Config`] when either value is empty, so a
    /// misconfigured client is rejected before any network call.
    pub fn new(account_id: impl Into<String>, application_key: impl Into<String>) -> Result<Self> {
        let account_id = account_id.into();
        let application_key = application_key.into();

        if account_id.is_empty() || application_key.is_empty() {
            return Err(Error::Config("No id or key for B2 account".into()));
        }

        Ok(Self {
            account_id,
            application_key,
        })
    }

    /// Read credentials from the environment
    ///
    /// Looks up `B2_ACCOUNT_ID` and `B2_APPLICATION_KEY`.
    pub fn from_env() -> Result<Self> {
        let account_id = std::env::var(ACCOUNT_ID_VAR).unwrap_or_default();
        let application_key = std::env::var(APPLICATION_KEY_VAR).unwrap_or_default();
        Self::new(account_id, application_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_credentials() {
        let creds = Credentials::new("account", "key").unwrap();
        assert_eq!(creds.account_id, "account");
        assert_eq!(creds.application_key, "key");
    }

    #[test]
    fn test_empty_account_id_rejected() {
        let result = Credentials::new("", "key");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No id or key"));
    }

    #[test]
    fn test_empty_application_key_rejected() {
        assert!(Credentials::new("account", "").is_err());
    }
}
