//! LineMessagingClient -- [`MessagingPlatform`] over the LINE Messaging API.
//!
//! Replies and profile lookups go to `api.line.me`; media content is served
//! from `api-data.line.me`. The channel access token is a [`SecretString`]
//! and only exposed when building the bearer header.

use std::time::Duration;

use birdie_core::messaging::platform::MessagingPlatform;
use birdie_types::error::MessagingError;
use birdie_types::message::{OutboundMessage, QuickReply};
use secrecy::{ExposeSecret, SecretString};

use super::types::{LineMessage, Profile, QuickReplyAction, QuickReplyItem, QuickReplyItems, ReplyRequest};

/// LINE accepts at most this many messages per reply.
const MAX_REPLY_MESSAGES: usize = 5;
/// Quick-reply button labels are capped at 20 characters.
const MAX_LABEL_CHARS: usize = 20;
const MAX_QUICK_REPLY_ITEMS: usize = 13;

pub struct LineMessagingClient {
    client: reqwest::Client,
    token: SecretString,
    api_base: String,
    data_base: String,
}

impl LineMessagingClient {
    pub fn new(token: SecretString) -> Result<Self, MessagingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| MessagingError::Request(e.to_string()))?;
        Ok(Self {
            client,
            token,
            api_base: "https://api.line.me".to_string(),
            data_base: "https://api-data.line.me".to_string(),
        })
    }

    /// Override both API hosts (useful for testing or proxies).
    pub fn with_base_urls(mut self, api_base: String, data_base: String) -> Self {
        self.api_base = api_base;
        self.data_base = data_base;
        self
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MessagingError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MessagingError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn label(s: &str) -> String {
    s.chars().take(MAX_LABEL_CHARS).collect()
}

/// Map a platform-agnostic message to the LINE wire shape.
pub(crate) fn to_line_message(message: OutboundMessage) -> LineMessage {
    match message {
        OutboundMessage::Text {
            text,
            quick_replies,
        } => {
            let items: Vec<QuickReplyItem> = quick_replies
                .into_iter()
                .take(MAX_QUICK_REPLY_ITEMS)
                .map(|reply| QuickReplyItem {
                    kind: "action",
                    action: match reply {
                        QuickReply::Postback { label: l, data } => QuickReplyAction::Postback {
                            label: label(&l),
                            display_text: l,
                            data,
                        },
                        QuickReply::Camera { label: l } => QuickReplyAction::Camera { label: label(&l) },
                        QuickReply::CameraRoll { label: l } => {
                            QuickReplyAction::CameraRoll { label: label(&l) }
                        }
                    },
                })
                .collect();
            LineMessage::Text {
                text,
                quick_reply: (!items.is_empty()).then_some(QuickReplyItems { items }),
            }
        }
        OutboundMessage::Video { url, preview_url } => LineMessage::Video {
            original_content_url: url,
            preview_image_url: preview_url,
        },
    }
}

impl MessagingPlatform for LineMessagingClient {
    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, MessagingError> {
        let url = format!("{}/v2/bot/message/{message_id}/content", self.data_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| MessagingError::Request(e.to_string()))?;
        let bytes = Self::check(response)
            .await?
            .bytes()
            .await
            .map_err(|e| MessagingError::Request(e.to_string()))?;
        tracing::debug!(message_id, size = bytes.len(), "downloaded message content");
        Ok(bytes.to_vec())
    }

    async fn reply(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), MessagingError> {
        if messages.len() > MAX_REPLY_MESSAGES {
            tracing::warn!(count = messages.len(), "reply truncated to platform limit");
        }
        let body = ReplyRequest {
            reply_token,
            messages: messages
                .into_iter()
                .take(MAX_REPLY_MESSAGES)
                .map(to_line_message)
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| MessagingError::Request(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn display_name(&self, user_id: &str) -> Result<String, MessagingError> {
        let response = self
            .client
            .get(format!("{}/v2/bot/profile/{user_id}", self.api_base))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| MessagingError::Request(e.to_string()))?;
        let profile: Profile = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| MessagingError::InvalidPayload(e.to_string()))?;
        Ok(profile.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_with_quick_replies_wire_shape() {
        let msg = OutboundMessage::text("Pick").with_quick_replies(vec![
            QuickReply::Postback {
                label: "A very long label that overflows".into(),
                data: "type=analyze_video&skill=lift".into(),
            },
            QuickReply::Camera {
                label: "Record".into(),
            },
            QuickReply::CameraRoll {
                label: "Choose video".into(),
            },
        ]);

        let wire = serde_json::to_value(to_line_message(msg)).unwrap();
        assert_eq!(
            wire,
            json!({
                "type": "text",
                "text": "Pick",
                "quickReply": {"items": [
                    {"type": "action", "action": {
                        "type": "postback",
                        "label": "A very long label th",
                        "data": "type=analyze_video&skill=lift",
                        "displayText": "A very long label that overflows"
                    }},
                    {"type": "action", "action": {"type": "camera", "label": "Record"}},
                    {"type": "action", "action": {"type": "cameraRoll", "label": "Choose video"}}
                ]}
            })
        );
    }

    #[test]
    fn test_plain_text_has_no_quick_reply_key() {
        let wire = serde_json::to_value(to_line_message(OutboundMessage::text("hi"))).unwrap();
        assert_eq!(wire, json!({"type": "text", "text": "hi"}));
    }

    #[test]
    fn test_video_wire_shape() {
        let wire = serde_json::to_value(to_line_message(OutboundMessage::Video {
            url: "https://v".into(),
            preview_url: "https://p".into(),
        }))
        .unwrap();
        assert_eq!(
            wire,
            json!({"type": "video", "originalContentUrl": "https://v", "previewImageUrl": "https://p"})
        );
    }
}
