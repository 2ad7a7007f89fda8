//! Storage of the OAuth credentials used to sign portal requests

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

/// Name of the credentials file in the data directory
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// The consumer key pair identifies this application, the token pair identifies the signed-in user
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialStore {
    consumer_key: String,
    consumer_secret: String,
    token: Option<String>,
    token_secret: Option<String>,
}

// Secrets are never printed
impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("consumer_key", &self.consumer_key)
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}

impl CredentialStore {
    /// Create a store for an application that no user has signed in yet
    pub fn new<S: ToString, T: ToString>(consumer_key: S, consumer_secret: T) -> Self {
        Self {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            token: None,
            token_secret: None,
        }
    }

    /// Load the credentials stored in `data_dir`
    pub fn from_file(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CREDENTIALS_FILE);
        let file = std::fs::File::open(&path)
            .map_err(|err| PortalError::Config(format!("Unable to open credentials {:?}: {}", path, err)))?;
        serde_json::from_reader(file)
            .map_err(|err| PortalError::Config(format!("Invalid credentials file {:?}: {}", path, err)))
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let content = serde_json::to_vec(self)
            .map_err(|err| PortalError::Config(format!("Unable to serialize credentials: {}", err)))?;
        crate::utils::write_atomically(&data_dir.join(CREDENTIALS_FILE), &content)
    }

    pub fn set_token<S: ToString, T: ToString>(&mut self, token: S, token_secret: T) {
        self.token = Some(token.to_string());
        self.token_secret = Some(token_secret.to_string());
    }

    /// Forget the user token (i.e. sign out). The consumer key pair is kept
    pub fn clear_token(&mut self) {
        self.token = None;
        self.token_secret = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.signing_keys().is_ok()
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Returns `(consumer_key, consumer_secret, token, token_secret)`, or an error if any of them is missing
    pub(crate) fn signing_keys(&self) -> Result<(&str, &str, &str, &str)> {
        fn non_empty<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str> {
            match value {
                Some(v) if v.is_empty() == false => Ok(v),
                _ => Err(PortalError::Signing(format!("missing {}", what))),
            }
        }

        Ok((
            non_empty(Some(&self.consumer_key), "consumer key")?,
            non_empty(Some(&self.consumer_secret), "consumer secret")?,
            non_empty(self.token.as_deref(), "token")?,
            non_empty(self.token_secret.as_deref(), "token secret")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let mut creds = CredentialStore::new("key", "secret");
        assert_eq!(creds.is_signed_in(), false);

        creds.set_token("token", "token-secret");
        assert!(creds.is_signed_in());
        assert_eq!(creds.signing_keys().unwrap(), ("key", "secret", "token", "token-secret"));

        creds.clear_token();
        assert_eq!(creds.is_signed_in(), false);
        assert!(matches!(creds.signing_keys(), Err(PortalError::Signing(_))));
    }

    #[test]
    fn empty_secret_is_incomplete() {
        let mut creds = CredentialStore::new("key", "secret");
        creds.set_token("token", "");
        assert_eq!(creds.is_signed_in(), false);
    }

    #[test]
    fn debug_hides_secrets() {
        let mut creds = CredentialStore::new("key", "very-secret");
        creds.set_token("token", "token-secret");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("very-secret") == false);
        assert!(printed.contains("token-secret") == false);
    }

    #[test]
    fn serde_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut creds = CredentialStore::new("key", "secret");
        creds.set_token("token", "token-secret");
        creds.save(dir.path()).unwrap();

        let retrieved = CredentialStore::from_file(dir.path()).unwrap();
        assert_eq!(creds, retrieved);
    }
}
