//! SQLite user repository implementation.
//!
//! Implements `UserRepository` from `birdie-core` on top of the document
//! store's `users` collection. Portfolio mutations are single-transaction
//! read-modify-writes of the user's document.

use birdie_core::repository::user::UserRepository;
use birdie_types::error::{PortfolioError, RepositoryError};
use birdie_types::portfolio::{DateKey, UserData, WorkEntry, WorkField};
use birdie_types::skill::{Handedness, Skill};

use super::document::{DocumentStore, USERS};

pub struct SqliteUserRepository {
    docs: DocumentStore,
}

impl SqliteUserRepository {
    pub fn new(docs: DocumentStore) -> Self {
        Self { docs }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn get(&self, user_id: &str) -> Result<Option<UserData>, RepositoryError> {
        self.docs.get(USERS, user_id).await
    }

    async fn put(&self, user: &UserData) -> Result<(), RepositoryError> {
        self.docs.put(USERS, &user.id, user).await
    }

    async fn set_handedness(
        &self,
        user_id: &str,
        handedness: Handedness,
    ) -> Result<(), RepositoryError> {
        self.docs
            .update(USERS, user_id, |user: &mut UserData| {
                user.handedness = handedness;
                Ok(())
            })
            .await
    }

    async fn insert_work_entry(
        &self,
        user_id: &str,
        skill: Skill,
        entry: &WorkEntry,
    ) -> Result<(), RepositoryError> {
        let entry = entry.clone();
        self.docs
            .update(USERS, user_id, move |user: &mut UserData| {
                user.portfolio.insert(skill, entry);
                Ok(())
            })
            .await
    }

    async fn update_work_entry(
        &self,
        user_id: &str,
        skill: Skill,
        date_key: &DateKey,
        field: &WorkField,
    ) -> Result<WorkEntry, RepositoryError> {
        self.docs
            .update(USERS, user_id, |user: &mut UserData| {
                match user.portfolio.update(skill, date_key, field) {
                    Ok(entry) => Ok(entry.clone()),
                    Err(PortfolioError::EntryNotFound { .. }) => Err(RepositoryError::NotFound),
                    Err(e) => Err(RepositoryError::Query(e.to_string())),
                }
            })
            .await
    }
}
