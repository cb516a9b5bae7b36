//! Bearer tokens for the Drive API.
//!
//! Access tokens are minted from a service account key and refreshed by
//! `gcp_auth` before they expire, so a long-running server never sends a
//! stale token.

use std::future::Future;
use std::path::Path;

use birdie_types::error::StorageError;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use secrecy::{ExposeSecret, SecretString};

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Supplies a currently valid bearer token for each Drive request.
pub trait TokenSource: Send + Sync {
    fn bearer(&self) -> impl Future<Output = Result<SecretString, StorageError>> + Send;
}

/// Where a service account key comes from.
#[derive(Debug, PartialEq, Eq)]
pub enum CredentialsSource<'a> {
    Inline(&'a str),
    File(&'a Path),
}

impl<'a> CredentialsSource<'a> {
    /// A value starting with `{` is the key itself; anything else is a path.
    pub fn classify(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            CredentialsSource::Inline(trimmed)
        } else {
            CredentialsSource::File(Path::new(trimmed))
        }
    }
}

pub struct ServiceAccountTokens {
    account: CustomServiceAccount,
}

impl ServiceAccountTokens {
    pub fn from_credentials(credentials: &SecretString) -> Result<Self, StorageError> {
        let account = match CredentialsSource::classify(credentials.expose_secret()) {
            CredentialsSource::Inline(json) => CustomServiceAccount::from_json(json),
            CredentialsSource::File(path) => CustomServiceAccount::from_file(path),
        }
        .map_err(|e| StorageError::Auth(format!("invalid service account key: {e}")))?;
        Ok(Self { account })
    }
}

impl TokenSource for ServiceAccountTokens {
    async fn bearer(&self) -> Result<SecretString, StorageError> {
        let token = self
            .account
            .token(&[DRIVE_SCOPE])
            .await
            .map_err(|e| StorageError::Auth(e.to_string()))?;
        Ok(SecretString::from(token.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_key_is_detected() {
        assert_eq!(
            CredentialsSource::classify("  {\"type\":\"service_account\"}"),
            CredentialsSource::Inline("{\"type\":\"service_account\"}")
        );
        assert_eq!(
            CredentialsSource::classify("/etc/birdie/drive.json"),
            CredentialsSource::File(Path::new("/etc/birdie/drive.json"))
        );
    }

    const KEY_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/service-account.json");

    #[test]
    fn test_key_loads_from_file_or_inline() {
        assert!(ServiceAccountTokens::from_credentials(&SecretString::from(KEY_FIXTURE)).is_ok());
        let inline = std::fs::read_to_string(KEY_FIXTURE).unwrap();
        assert!(ServiceAccountTokens::from_credentials(&SecretString::from(inline)).is_ok());
    }

    #[test]
    fn test_malformed_inline_key_is_rejected() {
        let err = ServiceAccountTokens::from_credentials(&SecretString::from("{not json"))
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::Auth(_)));
    }

    #[test]
    fn test_missing_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = ServiceAccountTokens::from_credentials(&SecretString::from(
            path.display().to_string(),
        ))
        .err()
        .unwrap();
        assert!(matches!(err, StorageError::Auth(_)));
    }
}
