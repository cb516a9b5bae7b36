//! Credentials read from environment variables.
//!
//! Every value is wrapped in [`SecretString`] as soon as it is read, so it
//! never shows up in `Debug` output or logs.

use secrecy::SecretString;
use thiserror::Error;

pub const LINE_CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";
pub const LINE_CHANNEL_TOKEN: &str = "LINE_CHANNEL_TOKEN";
pub const GENAI_USER: &str = "GENAI_USER";
pub const GENAI_PASSWORD: &str = "GENAI_PASSWORD";
pub const GOOGLE_DRIVE_CREDENTIALS: &str = "GOOGLE_DRIVE_CREDENTIALS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
}

#[derive(Debug)]
pub struct EnvSecrets {
    pub line_channel_secret: SecretString,
    pub line_channel_token: SecretString,
    /// Service account key for Drive: a file path or the inline JSON key.
    pub drive_credentials: SecretString,
    /// Analysis service basic auth; absent when the service is unauthenticated.
    pub genai_user: Option<String>,
    pub genai_password: Option<SecretString>,
}

impl EnvSecrets {
    pub fn from_env() -> Result<Self, SecretError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SecretError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &'static str| {
            get(key)
                .map(SecretString::from)
                .ok_or(SecretError::Missing(key))
        };

        Ok(Self {
            line_channel_secret: required(LINE_CHANNEL_SECRET)?,
            line_channel_token: required(LINE_CHANNEL_TOKEN)?,
            drive_credentials: required(GOOGLE_DRIVE_CREDENTIALS)?,
            genai_user: get(GENAI_USER),
            genai_password: get(GENAI_PASSWORD).map(SecretString::from),
        })
    }
}
