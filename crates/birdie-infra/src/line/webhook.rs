//! LINE webhook signature verification and event translation.
//!
//! `verify_signature()` checks the `x-line-signature` header: a base64
//! HMAC-SHA256 of the raw request body keyed with the channel secret.
//! `parse_events()` turns the JSON payload into platform-agnostic
//! [`InboundEvent`]s.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use birdie_types::error::MessagingError;
use birdie_types::event::{EventKind, InboundEvent, MessageContent};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::types::{WebhookBody, WebhookEvent};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Verify a webhook body against its base64 signature in constant time.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> Result<(), MessagingError> {
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| MessagingError::InvalidSignature)?;

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| MessagingError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| MessagingError::InvalidSignature)
}

/// Compute the signature LINE would send for `body`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, MessagingError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| MessagingError::InvalidSignature)?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Parse a webhook payload into inbound events.
///
/// Events without a user source (e.g. group-only events) are dropped.
pub fn parse_events(body: &[u8]) -> Result<Vec<InboundEvent>, MessagingError> {
    let payload: WebhookBody = serde_json::from_slice(body)
        .map_err(|e| MessagingError::InvalidPayload(e.to_string()))?;

    Ok(payload
        .events
        .into_iter()
        .filter_map(|event| {
            let translated = translate(event);
            if translated.is_none() {
                tracing::debug!("dropping webhook event without a user source");
            }
            translated
        })
        .collect())
}

fn translate(event: WebhookEvent) -> Option<InboundEvent> {
    let user_id = event.source.as_ref()?.user_id.clone()?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(event.timestamp).unwrap_or_else(Utc::now);

    let kind = match event.kind.as_str() {
        "follow" => EventKind::Follow,
        "postback" => match event.postback {
            Some(pb) => EventKind::Postback { data: pb.data },
            None => EventKind::Unsupported("postback without data".to_string()),
        },
        "message" => match event.message {
            Some(msg) => EventKind::Message(match msg.kind.as_str() {
                "text" => MessageContent::Text(msg.text.unwrap_or_default()),
                "video" => MessageContent::Video { message_id: msg.id },
                other => MessageContent::Other(other.to_string()),
            }),
            None => EventKind::Unsupported("message without body".to_string()),
        },
        other => EventKind::Unsupported(other.to_string()),
    };

    Some(InboundEvent {
        user_id,
        reply_token: event.reply_token.unwrap_or_default(),
        timestamp,
        kind,
    })
}
