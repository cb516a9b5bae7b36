use thiserror::Error;

use crate::skill::Skill;

/// Errors from repository operations (used by trait definitions in birdie-core).
///
/// "Document not found" is not an error: repository reads return `Ok(None)`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to portfolio lookups and mutations.
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("unknown skill: '{0}'")]
    UnknownSkill(String),

    #[error("no storage folder registered for skill '{0}'")]
    FolderMissing(Skill),

    #[error("no work entry for skill '{skill}' at '{date_key}'")]
    EntryNotFound { skill: Skill, date_key: String },

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<RepositoryError> for PortfolioError {
    fn from(e: RepositoryError) -> Self {
        PortfolioError::StorageError(e.to_string())
    }
}

/// An event arrived that the current session state does not accept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("session is busy in state '{0}'")]
    Busy(String),

    #[error("session is not writing a reflection or preview note")]
    NotWriting,

    #[error("no date selected for the entry being edited")]
    NoDateSelected,
}

/// Errors from the messaging platform (LINE).
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("messaging request failed: {0}")]
    Request(String),

    #[error("messaging API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// Errors from the object store (Google Drive).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(String),

    #[error("storage API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid storage response: {0}")]
    InvalidResponse(String),

    #[error("storage authentication failed: {0}")]
    Auth(String),
}

/// Errors from the external transcoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("transcoder not available: {0}")]
    NotAvailable(String),

    #[error("transcoder exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("io error: {0}")]
    Io(String),
}

/// Errors from the AI analysis service.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis service busy after {attempts} attempts")]
    Busy { attempts: u32 },

    #[error("analysis service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("analysis transport error: {0}")]
    Transport(String),

    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),
}
