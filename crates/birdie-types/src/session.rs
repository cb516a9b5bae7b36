//! Per-user conversation session state.
//!
//! The session gates which inbound event type is currently expected from a
//! user and carries the in-flight context (selected skill, entry being
//! edited). The tagged [`SessionState`] makes "skill exists iff not idle"
//! hold by construction.
//!
//! Transitions are pure functions returning the replacement state; the
//! service layer persists the full [`ConversationSession`] after each one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::error::TransitionError;
use crate::portfolio::DateKey;
use crate::skill::Skill;

/// Which free-text field a writing session fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingKind {
    Reflection,
    PreviewNote,
}

impl WritingKind {
    pub fn label(&self) -> &'static str {
        match self {
            WritingKind::Reflection => "reflection",
            WritingKind::PreviewNote => "preview note",
        }
    }
}

/// Conversation state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    UploadingVideo {
        skill: Skill,
    },
    WritingReflection {
        skill: Skill,
        updating_date: Option<DateKey>,
    },
    WritingPreviewNote {
        skill: Skill,
        updating_date: Option<DateKey>,
    },
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Skill in flight, `None` only when idle.
    pub fn skill(&self) -> Option<Skill> {
        match self {
            SessionState::Idle => None,
            SessionState::UploadingVideo { skill }
            | SessionState::WritingReflection { skill, .. }
            | SessionState::WritingPreviewNote { skill, .. } => Some(*skill),
        }
    }

    /// Entry being edited, only ever set while writing.
    pub fn updating_date(&self) -> Option<&DateKey> {
        match self {
            SessionState::WritingReflection { updating_date, .. }
            | SessionState::WritingPreviewNote { updating_date, .. } => updating_date.as_ref(),
            _ => None,
        }
    }

    pub fn writing_kind(&self) -> Option<WritingKind> {
        match self {
            SessionState::WritingReflection { .. } => Some(WritingKind::Reflection),
            SessionState::WritingPreviewNote { .. } => Some(WritingKind::PreviewNote),
            _ => None,
        }
    }

    /// `Idle -> UploadingVideo`.
    pub fn begin_upload(&self, skill: Skill) -> Result<SessionState, TransitionError> {
        self.require_idle()?;
        Ok(SessionState::UploadingVideo { skill })
    }

    /// `Idle -> WritingReflection | WritingPreviewNote`, no date selected yet.
    pub fn begin_writing(
        &self,
        kind: WritingKind,
        skill: Skill,
    ) -> Result<SessionState, TransitionError> {
        self.require_idle()?;
        Ok(match kind {
            WritingKind::Reflection => SessionState::WritingReflection {
                skill,
                updating_date: None,
            },
            WritingKind::PreviewNote => SessionState::WritingPreviewNote {
                skill,
                updating_date: None,
            },
        })
    }

    /// Narrow the entry being edited. The state itself does not change.
    pub fn select_date(&self, date: DateKey) -> Result<SessionState, TransitionError> {
        match self {
            SessionState::WritingReflection { skill, .. } => Ok(SessionState::WritingReflection {
                skill: *skill,
                updating_date: Some(date),
            }),
            SessionState::WritingPreviewNote { skill, .. } => {
                Ok(SessionState::WritingPreviewNote {
                    skill: *skill,
                    updating_date: Some(date),
                })
            }
            _ => Err(TransitionError::NotWriting),
        }
    }

    /// Target of a text reply: the field kind, skill and selected date.
    pub fn writing_target(&self) -> Result<(WritingKind, Skill, &DateKey), TransitionError> {
        let kind = self.writing_kind().ok_or(TransitionError::NotWriting)?;
        let skill = self.skill().ok_or(TransitionError::NotWriting)?;
        let date = self.updating_date().ok_or(TransitionError::NoDateSelected)?;
        Ok((kind, skill, date))
    }

    fn require_idle(&self) -> Result<(), TransitionError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(TransitionError::Busy(self.to_string()))
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::UploadingVideo { .. } => write!(f, "uploading_video"),
            SessionState::WritingReflection { .. } => write!(f, "writing_reflection"),
            SessionState::WritingPreviewNote { .. } => write!(f, "writing_preview_note"),
        }
    }
}

/// The persisted session document, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub user_id: String,
    #[serde(flatten)]
    pub state: SessionState,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// A fresh idle session for first contact.
    pub fn idle(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: SessionState::Idle,
            updated_at: Utc::now(),
        }
    }

    /// Complete replacement carrying a new state.
    pub fn with_state(&self, state: SessionState) -> Self {
        Self {
            user_id: self.user_id.clone(),
            state,
            updated_at: Utc::now(),
        }
    }
}
