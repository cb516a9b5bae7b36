//! User profile and portfolio repository trait definition.

use birdie_types::error::RepositoryError;
use birdie_types::portfolio::{DateKey, UserData, WorkEntry, WorkField};
use birdie_types::skill::{Handedness, Skill};

/// Repository trait for per-user profile documents.
///
/// Portfolio mutations are atomic per document: an implementation applies
/// the change inside a single write so that a half-built [`WorkEntry`] is
/// never observable.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserRepository: Send + Sync {
    /// Get a user by id. `Ok(None)` when the user has never been seen.
    fn get(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserData>, RepositoryError>> + Send;

    /// Create or fully replace a user document.
    fn put(
        &self,
        user: &UserData,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite only the handedness field.
    fn set_handedness(
        &self,
        user_id: &str,
        handedness: Handedness,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a complete entry into the skill bucket.
    fn insert_work_entry(
        &self,
        user_id: &str,
        skill: Skill,
        entry: &WorkEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite one free-text field of an existing entry.
    ///
    /// Returns `RepositoryError::NotFound` when the user or entry is missing.
    fn update_work_entry(
        &self,
        user_id: &str,
        skill: Skill,
        date_key: &DateKey,
        field: &WorkField,
    ) -> impl std::future::Future<Output = Result<WorkEntry, RepositoryError>> + Send;
}
