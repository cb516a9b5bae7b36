//! Session service: loads, transitions and persists conversation sessions.
//!
//! Every write is a complete replacement of the user's session document and
//! is awaited before the caller replies to the user.

use birdie_types::error::RepositoryError;
use birdie_types::session::{ConversationSession, SessionState};

use crate::repository::session::SessionRepository;

pub struct SessionService<S: SessionRepository> {
    repo: S,
}

impl<S: SessionRepository> SessionService<S> {
    pub fn new(repo: S) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &S {
        &self.repo
    }

    /// Current session for a user, creating an idle one on first contact.
    ///
    /// A failed read is treated as "no session" so a broken document never
    /// wedges a user.
    pub async fn load(&self, user_id: &str) -> ConversationSession {
        match self.repo.get(user_id).await {
            Ok(Some(session)) => return session,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id, error = %e, "failed to read session, starting idle");
            }
        }

        let session = ConversationSession::idle(user_id);
        if let Err(e) = self.repo.put(&session).await {
            tracing::warn!(user_id, error = %e, "failed to create session");
        }
        session
    }

    /// Persist `state` as the user's new session.
    pub async fn transition(
        &self,
        current: &ConversationSession,
        state: SessionState,
    ) -> Result<ConversationSession, RepositoryError> {
        let next = current.with_state(state);
        self.repo.put(&next).await?;
        tracing::debug!(user_id = %next.user_id, from = %current.state, to = %next.state, "session transition");
        Ok(next)
    }

    /// Force the user back to idle.
    pub async fn reset(&self, user_id: &str) -> Result<ConversationSession, RepositoryError> {
        let session = ConversationSession::idle(user_id);
        self.repo.put(&session).await?;
        Ok(session)
    }

    /// Reset, logging instead of failing. Used on exit paths where the
    /// user has already been answered.
    pub async fn reset_logged(&self, user_id: &str) {
        if let Err(e) = self.reset(user_id).await {
            tracing::error!(user_id, error = %e, "failed to reset session");
        }
    }
}
