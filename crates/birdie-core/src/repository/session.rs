//! Conversation session repository trait definition.

use birdie_types::error::RepositoryError;
use birdie_types::session::ConversationSession;

/// Repository trait for per-user session documents.
///
/// Writes are full replacements (last write wins); the store's per-document
/// atomicity is the only serialization point.
pub trait SessionRepository: Send + Sync {
    /// Get the session for a user. `Ok(None)` when none exists yet.
    fn get(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ConversationSession>, RepositoryError>> + Send;

    /// Create or overwrite the session document.
    fn put(
        &self,
        session: &ConversationSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
