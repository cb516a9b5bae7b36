//! Outbound reply messages.
//!
//! Kept deliberately small: plain text with optional quick-reply buttons, and
//! a video message. Card layouts are the messaging adapter's concern.

use serde::{Deserialize, Serialize};

/// A quick-reply button under a text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuickReply {
    /// Sends `data` back as a postback event.
    Postback { label: String, data: String },
    /// Opens the device camera.
    Camera { label: String },
    /// Opens the device gallery.
    CameraRoll { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        quick_replies: Vec<QuickReply>,
    },
    Video {
        url: String,
        preview_url: String,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text {
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }

    pub fn with_quick_replies(self, replies: Vec<QuickReply>) -> Self {
        match self {
            OutboundMessage::Text { text, .. } => OutboundMessage::Text {
                text,
                quick_replies: replies,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_quick_replies_only_touches_text() {
        let msg = OutboundMessage::text("pick one").with_quick_replies(vec![QuickReply::Camera {
            label: "Record".into(),
        }]);
        match msg {
            OutboundMessage::Text { quick_replies, .. } => assert_eq!(quick_replies.len(), 1),
            _ => panic!("expected text"),
        }

        let video = OutboundMessage::Video {
            url: "u".into(),
            preview_url: "p".into(),
        };
        assert_eq!(video.clone().with_quick_replies(vec![]), video);
    }
}
