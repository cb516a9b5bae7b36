//! EventRouter -- dispatches inbound events against the user's session.
//!
//! The session decides which event type is expected. Anything else gets
//! the default reply and leaves the state alone. Video events in the
//! upload state are handed to the ingestion pipeline under the per-user
//! [`IngestionGuard`].

use std::sync::Arc;

use birdie_types::config::AppConfig;
use birdie_types::error::{RepositoryError, StorageError, TransitionError};
use birdie_types::event::{EventKind, InboundEvent, MessageContent, Postback, UserAction, VideoSubmission};
use birdie_types::message::OutboundMessage;
use birdie_types::portfolio::{DateKey, UserData, UserFolders, WorkField};
use birdie_types::session::{ConversationSession, SessionState, WritingKind};
use birdie_types::skill::{Handedness, Skill};

use crate::conversation::guard::IngestionGuard;
use crate::messaging::platform::MessagingPlatform;
use crate::messaging::replies;
use crate::pipeline::ingest::{IngestionReport, VideoIngestionPipeline};
use crate::ports::{Backends, Ports};
use crate::repository::user::UserRepository;
use crate::storage::object_store::ObjectStore;

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Replied,
    Ingested(IngestionReport),
    /// Nothing to answer (unsupported event type).
    Ignored,
}

#[derive(Debug, thiserror::Error)]
enum RouteError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Text menu commands. Each one abandons whatever the user was doing.
fn menu_command(text: &str) -> Option<MenuCommand> {
    match text.trim().to_lowercase().as_str() {
        "analyze video" => Some(MenuCommand::Handedness(UserAction::AnalyzeVideo)),
        "expert video" => Some(MenuCommand::Handedness(UserAction::ViewExpertVideo)),
        "add reflection" => Some(MenuCommand::Skill(UserAction::AddReflection)),
        "add preview note" => Some(MenuCommand::Skill(UserAction::AddPreviewNote)),
        "portfolio" => Some(MenuCommand::Skill(UserAction::ViewPortfolio)),
        "syllabus" => Some(MenuCommand::Syllabus),
        _ => None,
    }
}

enum MenuCommand {
    Handedness(UserAction),
    Skill(UserAction),
    Syllabus,
}

pub struct EventRouter<B: Backends> {
    ports: Arc<Ports<B>>,
    pipeline: VideoIngestionPipeline<B>,
    guard: IngestionGuard,
    config: Arc<AppConfig>,
}

impl<B: Backends> EventRouter<B> {
    pub fn new(
        ports: Arc<Ports<B>>,
        pipeline: VideoIngestionPipeline<B>,
        guard: IngestionGuard,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            ports,
            pipeline,
            guard,
            config,
        }
    }

    pub fn guard(&self) -> &IngestionGuard {
        &self.guard
    }

    /// Handle one inbound event to completion, including its reply.
    #[tracing::instrument(skip_all, fields(user_id = %event.user_id))]
    pub async fn handle(&self, event: InboundEvent) -> Dispatch {
        if let EventKind::Unsupported(kind) = &event.kind {
            tracing::debug!(kind = %kind, "ignoring unsupported event");
            return Dispatch::Ignored;
        }

        let user = match self.ensure_user(&event.user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "failed to onboard user");
                self.send(&event, replies::text(replies::GENERIC_ERROR)).await;
                return Dispatch::Replied;
            }
        };
        let session = self.ports.sessions.load(&event.user_id).await;

        let result = match &event.kind {
            EventKind::Follow => Ok(replies::text(replies::WELCOME)),
            EventKind::Message(MessageContent::Text(text)) => {
                self.on_text(&user, &session, text).await
            }
            EventKind::Message(MessageContent::Video { message_id }) => {
                return self.on_video(&event, message_id, &user, &session).await;
            }
            EventKind::Message(MessageContent::Other(kind)) => {
                tracing::debug!(kind = %kind, "unsupported message type");
                Ok(replies::text(replies::DEFAULT_REPLY))
            }
            EventKind::Postback { data } => self.on_postback(&user, &session, data).await,
            EventKind::Unsupported(_) => return Dispatch::Ignored,
        };

        let messages = match result {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(state = %session.state, error = %e, "event handling failed");
                self.ports.sessions.reset_logged(&user.id).await;
                replies::text(replies::GENERIC_ERROR)
            }
        };
        self.send(&event, messages).await;
        Dispatch::Replied
    }

    async fn send(&self, event: &InboundEvent, messages: Vec<OutboundMessage>) {
        self.ports
            .reply(&event.user_id, &event.reply_token, messages)
            .await;
    }

    /// Load the user, creating profile and folders on first contact.
    async fn ensure_user(&self, user_id: &str) -> Result<UserData, RouteError> {
        if let Some(user) = self.ports.users.get(user_id).await? {
            return Ok(user);
        }

        let name = match self.ports.messaging.display_name(user_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "display name lookup failed");
                String::new()
            }
        };

        let store = &self.ports.store;
        let root = store
            .create_folder(user_id, &self.config.drive.root_folder_id)
            .await?;
        let mut folders = UserFolders {
            root: root.id,
            skills: Default::default(),
        };
        for skill in Skill::ALL {
            let folder = store.create_folder(skill.label(), &folders.root).await?;
            folders.skills.insert(skill, folder.id);
        }

        let user = UserData::new(user_id, name, folders);
        self.ports.users.put(&user).await?;
        tracing::info!(user_id, "onboarded new user");
        Ok(user)
    }

    async fn on_text(
        &self,
        user: &UserData,
        session: &ConversationSession,
        text: &str,
    ) -> Result<Vec<OutboundMessage>, RouteError> {
        if let Some(command) = menu_command(text) {
            if !session.state.is_idle() && !self.guard.is_busy(&user.id) {
                self.ports.sessions.reset(&user.id).await?;
            }
            return Ok(match command {
                MenuCommand::Handedness(next) => replies::handedness_prompt(next),
                MenuCommand::Skill(action) => replies::skill_prompt(action),
                MenuCommand::Syllabus => match &self.config.syllabus_url {
                    Some(url) => replies::text(url.clone()),
                    None => replies::text(replies::NO_SYLLABUS),
                },
            });
        }

        if session.state.writing_kind().is_none() {
            return Ok(replies::text(replies::DEFAULT_REPLY));
        }

        let (kind, skill, date) = match session.state.writing_target() {
            Ok(target) => target,
            Err(TransitionError::NoDateSelected) => {
                return Ok(replies::text(replies::SELECT_DATE_FIRST));
            }
            Err(e) => return Err(e.into()),
        };

        let field = match kind {
            WritingKind::Reflection => WorkField::Reflection(text.to_string()),
            WritingKind::PreviewNote => WorkField::PreviewNote(text.to_string()),
        };
        self.ports
            .users
            .update_work_entry(&user.id, skill, date, &field)
            .await?;
        self.ports.sessions.reset(&user.id).await?;
        tracing::info!(user_id = %user.id, %skill, %date, kind = kind.label(), "entry note updated");
        Ok(replies::writing_saved(kind, skill, date))
    }

    async fn on_video(
        &self,
        event: &InboundEvent,
        message_id: &str,
        user: &UserData,
        session: &ConversationSession,
    ) -> Dispatch {
        if !matches!(session.state, SessionState::UploadingVideo { .. }) {
            tracing::debug!(state = %session.state, "video outside upload state");
            self.send(event, replies::text(replies::GENERIC_ERROR)).await;
            return Dispatch::Replied;
        }

        let Some(_permit) = self.guard.try_acquire(&user.id) else {
            tracing::info!("video rejected, previous ingestion still running");
            self.send(event, replies::text(replies::STILL_PROCESSING)).await;
            return Dispatch::Replied;
        };

        let submission = VideoSubmission {
            user_id: user.id.clone(),
            reply_token: event.reply_token.clone(),
            message_id: message_id.to_string(),
            submitted_at: event.timestamp,
        };
        Dispatch::Ingested(self.pipeline.run(submission, user, session).await)
    }

    async fn on_postback(
        &self,
        user: &UserData,
        session: &ConversationSession,
        data: &str,
    ) -> Result<Vec<OutboundMessage>, RouteError> {
        let postback = match Postback::parse(data) {
            Ok(postback) => postback,
            Err(e) => {
                tracing::debug!(data, error = %e, "unrecognized postback");
                return Ok(replies::text(replies::DEFAULT_REPLY));
            }
        };

        match postback {
            Postback::Handedness { handedness, next } => {
                self.set_handedness(user, handedness).await?;
                Ok(replies::skill_prompt(next))
            }
            Postback::Action { action, skill } => {
                if self.guard.is_busy(&user.id) {
                    return Ok(replies::text(replies::STILL_PROCESSING));
                }
                self.on_action(user, session, action, skill).await
            }
            Postback::SelectDate(date) => self.on_select_date(user, session, date).await,
            Postback::ViewVideo { skill, date } => match user.portfolio.get(skill, &date) {
                Some(entry) if entry.is_complete() => Ok(replies::video(
                    entry,
                    self.config.preview_placeholder_url.as_deref(),
                )),
                _ => {
                    tracing::debug!(user_id = %user.id, %skill, %date, "view request for unknown entry");
                    Ok(replies::text(replies::DEFAULT_REPLY))
                }
            },
        }
    }

    async fn set_handedness(&self, user: &UserData, handedness: Handedness) -> Result<(), RouteError> {
        if user.handedness != handedness {
            self.ports.users.set_handedness(&user.id, handedness).await?;
            tracing::debug!(user_id = %user.id, %handedness, "handedness updated");
        }
        Ok(())
    }

    /// A skill action always starts from a fresh idle session.
    async fn on_action(
        &self,
        user: &UserData,
        session: &ConversationSession,
        action: UserAction,
        skill: Skill,
    ) -> Result<Vec<OutboundMessage>, RouteError> {
        let fresh = SessionState::Idle;
        match action {
            UserAction::AnalyzeVideo => {
                self.ports
                    .sessions
                    .transition(session, fresh.begin_upload(skill)?)
                    .await?;
                Ok(replies::upload_prompt(skill))
            }
            UserAction::AddReflection | UserAction::AddPreviewNote => {
                let kind = if action == UserAction::AddReflection {
                    WritingKind::Reflection
                } else {
                    WritingKind::PreviewNote
                };
                fn is_complete(e: &&birdie_types::portfolio::WorkEntry) -> bool {
                    e.is_complete()
                }
                let mut entries = user
                    .portfolio
                    .entries(skill)
                    .filter(is_complete)
                    .peekable();
                if entries.peek().is_none() {
                    if !session.state.is_idle() {
                        self.ports.sessions.reset(&user.id).await?;
                    }
                    return Ok(replies::no_entries(skill));
                }
                self.ports
                    .sessions
                    .transition(session, fresh.begin_writing(kind, skill)?)
                    .await?;
                Ok(replies::date_prompt(kind, skill, entries))
            }
            UserAction::ViewPortfolio => {
                if !session.state.is_idle() {
                    self.ports.sessions.reset(&user.id).await?;
                }
                Ok(replies::portfolio_summary(skill, user.portfolio.entries(skill)))
            }
            UserAction::ViewExpertVideo => Ok(replies::expert_videos(
                skill,
                self.config.expert_videos_for(user.handedness, skill),
            )),
        }
    }

    async fn on_select_date(
        &self,
        user: &UserData,
        session: &ConversationSession,
        date: DateKey,
    ) -> Result<Vec<OutboundMessage>, RouteError> {
        let next = match session.state.select_date(date.clone()) {
            Ok(next) => next,
            Err(_) => return Ok(replies::text(replies::DEFAULT_REPLY)),
        };
        let (kind, skill, _) = next.writing_target()?;
        if user.portfolio.get(skill, &date).is_none() {
            tracing::debug!(user_id = %user.id, %skill, %date, "date selection for unknown entry");
            return Ok(replies::text(replies::DEFAULT_REPLY));
        }
        self.ports.sessions.transition(session, next).await?;
        Ok(replies::writing_prompt(kind, skill, &date))
    }
}
