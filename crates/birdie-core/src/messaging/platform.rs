//! Messaging platform trait definition.

use birdie_types::error::MessagingError;
use birdie_types::message::OutboundMessage;

/// Outbound side of the chat platform.
///
/// Implementations live in birdie-infra (e.g., `LineMessagingClient`).
pub trait MessagingPlatform: Send + Sync {
    /// Download the binary content of a media message.
    fn fetch_content(
        &self,
        message_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, MessagingError>> + Send;

    /// Reply to an event. A reply token can be used once.
    fn reply(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> impl std::future::Future<Output = Result<(), MessagingError>> + Send;

    /// Look up a user's display name.
    fn display_name(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<String, MessagingError>> + Send;
}
