//! SQLite session repository implementation.

use birdie_core::repository::session::SessionRepository;
use birdie_types::error::RepositoryError;
use birdie_types::session::ConversationSession;

use super::document::{DocumentStore, SESSIONS};

pub struct SqliteSessionRepository {
    docs: DocumentStore,
}

impl SqliteSessionRepository {
    pub fn new(docs: DocumentStore) -> Self {
        Self { docs }
    }
}

impl SessionRepository for SqliteSessionRepository {
    async fn get(&self, user_id: &str) -> Result<Option<ConversationSession>, RepositoryError> {
        self.docs.get(SESSIONS, user_id).await
    }

    async fn put(&self, session: &ConversationSession) -> Result<(), RepositoryError> {
        self.docs.put(SESSIONS, &session.user_id, session).await
    }
}
