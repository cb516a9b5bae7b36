//! VideoIngestionPipeline -- turns one submitted video into a portfolio entry.
//!
//! Stages run strictly in order: acquire, transcode, analyze, thumbnail,
//! upload, persist, notify. Whatever happens, every temp file is released
//! and the user's session is reset to idle before `run` returns. A failing
//! stage produces exactly one generic error reply; the thumbnail stage is
//! the only one allowed to degrade instead of fail.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use birdie_types::analysis::{AnalysisRequest, SkeletonVideo};
use birdie_types::config::{PipelineConfig, ThumbnailStrategy};
use birdie_types::error::{
    AnalysisError, MessagingError, PortfolioError, RepositoryError, StorageError, TranscodeError,
};
use birdie_types::event::VideoSubmission;
use birdie_types::portfolio::{DateKey, UserData, WorkEntry};
use birdie_types::session::{ConversationSession, SessionState};
use birdie_types::skill::Skill;

use crate::media::temp::{TempResource, TempSet};
use crate::media::transcoder::Transcoder;
use crate::messaging::platform::MessagingPlatform;
use crate::messaging::replies;
use crate::ports::{Backends, Ports};
use crate::repository::user::UserRepository;
use crate::storage::object_store::{ObjectStore, StoredObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    Transcode,
    Analyze,
    Thumbnail,
    Upload,
    Persist,
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Acquire => "acquire",
            Stage::Transcode => "transcode",
            Stage::Analyze => "analyze",
            Stage::Thumbnail => "thumbnail",
            Stage::Upload => "upload",
            Stage::Persist => "persist",
            Stage::Notify => "notify",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Messaging(#[from] MessagingError),
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

/// Tag a stage's error with the stage it came from.
fn at<E: Into<StageError>>(stage: Stage) -> impl FnOnce(E) -> PipelineError {
    move |e| PipelineError {
        stage,
        source: e.into(),
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionReport {
    Completed {
        date_key: DateKey,
        /// Analysis attempts used.
        attempts: u32,
        has_thumbnail: bool,
    },
    Failed {
        stage: Stage,
        attempts: u32,
    },
    /// The session was not expecting a video; nothing ran.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub work_dir: PathBuf,
    pub thumbnail_strategy: ThumbnailStrategy,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            work_dir: config.work_dir(),
            thumbnail_strategy: config.thumbnail_strategy,
            poll_attempts: config.thumbnail_poll_attempts,
            poll_interval: Duration::from_millis(config.thumbnail_poll_interval_ms),
        }
    }
}

/// What a successful run persisted.
struct Ingested {
    entry: WorkEntry,
    folder_link: String,
}

pub struct VideoIngestionPipeline<B: Backends> {
    ports: Arc<Ports<B>>,
    settings: PipelineSettings,
}

impl<B: Backends> VideoIngestionPipeline<B> {
    pub fn new(ports: Arc<Ports<B>>, settings: PipelineSettings) -> Self {
        Self { ports, settings }
    }

    /// Run the full pipeline for one submission.
    ///
    /// The caller has resolved `user` and `session`; a session that is not
    /// uploading is rejected without running any stage or touching state.
    pub async fn run(
        &self,
        submission: VideoSubmission,
        user: &UserData,
        session: &ConversationSession,
    ) -> IngestionReport {
        let skill = match &session.state {
            SessionState::UploadingVideo { skill } => *skill,
            other => {
                tracing::warn!(user_id = %user.id, state = %other, "video submitted outside upload state");
                return IngestionReport::Rejected;
            }
        };

        let date_key = DateKey::from_datetime(submission.submitted_at);
        let mut temps = TempSet::new();
        let mut attempts = 0;

        tracing::info!(user_id = %user.id, %skill, %date_key, "video ingestion started");

        let result = self
            .ingest(&submission, user, skill, &date_key, &mut temps, &mut attempts)
            .await;

        let report = match result {
            Ok(ingested) => {
                let delivered = self
                    .ports
                    .reply(
                        &user.id,
                        &submission.reply_token,
                        replies::upload_complete(skill, &ingested.folder_link),
                    )
                    .await;
                if !delivered {
                    tracing::error!(user_id = %user.id, stage = %Stage::Notify, "entry saved but confirmation not delivered");
                }
                tracing::info!(user_id = %user.id, %skill, %date_key, attempts, rating = ingested.entry.rating, "video ingestion completed");
                IngestionReport::Completed {
                    date_key,
                    attempts,
                    has_thumbnail: !ingested.entry.thumbnail_ref.is_empty(),
                }
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, %skill, stage = %e.stage, error = %e, "video ingestion failed");
                self.ports
                    .reply(
                        &user.id,
                        &submission.reply_token,
                        replies::text(replies::GENERIC_ERROR),
                    )
                    .await;
                IngestionReport::Failed {
                    stage: e.stage,
                    attempts,
                }
            }
        };

        let released = temps.release_all().await;
        tracing::debug!(user_id = %user.id, released, "temp resources released");
        self.ports.sessions.reset_logged(&user.id).await;
        report
    }

    async fn ingest(
        &self,
        submission: &VideoSubmission,
        user: &UserData,
        skill: Skill,
        date_key: &DateKey,
        temps: &mut TempSet,
        attempts: &mut u32,
    ) -> Result<Ingested, PipelineError> {
        let work_dir = &self.settings.work_dir;

        // Acquire
        let raw_bytes = self
            .ports
            .messaging
            .fetch_content(&submission.message_id)
            .await
            .map_err(at(Stage::Acquire))?;
        let raw = temps.track(
            TempResource::write(work_dir, &user.id, "raw", "mp4", &raw_bytes)
                .await
                .map_err(at(Stage::Acquire))?,
        );
        drop(raw_bytes);

        // Transcode. The raw download is not needed past this point either way.
        let resized = temps.track(TempResource::reserve(work_dir, &user.id, "resized", "mp4"));
        let resize_result = self.ports.transcoder.resize(&raw, &resized).await;
        temps.release_path(&raw).await;
        resize_result.map_err(at(Stage::Transcode))?;
        let resized_bytes = tokio::fs::read(&resized)
            .await
            .map_err(at(Stage::Transcode))?;

        // Analyze
        let request = AnalysisRequest {
            video: resized_bytes,
            filename: format!("{}_{}_{}.mp4", user.id, skill, date_key),
            handedness: user.handedness,
            skill,
        };
        let outcome = self.ports.analysis.analyze(&request).await;
        *attempts = outcome.attempts;
        let analysis = outcome.result.map_err(at(Stage::Analyze))?;
        tracing::debug!(user_id = %user.id, score = analysis.score, attempts = *attempts, "analysis finished");

        let final_video = match &analysis.skeleton {
            SkeletonVideo::Inline(bytes) => bytes.clone(),
            SkeletonVideo::Remote(url) => self
                .ports
                .analysis
                .fetch_video(url)
                .await
                .map_err(at(Stage::Analyze))?,
            SkeletonVideo::Absent => request.video,
        };

        // Thumbnail (local extraction only; polling happens after upload)
        let thumbnail = match self.settings.thumbnail_strategy {
            ThumbnailStrategy::Extract => self.extract_thumbnail(user, &final_video, temps).await,
            ThumbnailStrategy::PollStore => None,
        };

        // Upload
        let folder = user.folders.folder_for(skill).map_err(at(Stage::Upload))?;
        let video = self
            .ports
            .store
            .upload(folder, date_key.as_str(), "video/mp4", final_video)
            .await
            .map_err(at(Stage::Upload))?;
        let mut uploaded = vec![video.id.clone()];

        let thumbnail_ref = match thumbnail {
            Some(bytes) => match self
                .ports
                .store
                .upload(folder, date_key.as_str(), "image/jpeg", bytes)
                .await
            {
                Ok(StoredObject { id, link, .. }) => {
                    uploaded.push(id);
                    link
                }
                Err(e) => {
                    tracing::warn!(user_id = %user.id, stage = %Stage::Thumbnail, error = %e, "thumbnail upload failed, continuing without");
                    String::new()
                }
            },
            None if self.settings.thumbnail_strategy == ThumbnailStrategy::PollStore => {
                self.poll_thumbnail(user, &video.id).await
            }
            None => String::new(),
        };

        // Persist
        let entry = WorkEntry::new(
            date_key.clone(),
            video.link,
            thumbnail_ref,
            analysis.score,
            analysis.ai_note(),
        );
        if let Err(e) = self
            .ports
            .users
            .insert_work_entry(&user.id, skill, &entry)
            .await
        {
            self.rollback(user, &uploaded).await;
            return Err(at(Stage::Persist)(e));
        }

        Ok(Ingested {
            entry,
            folder_link: self.ports.store.folder_link(folder),
        })
    }

    /// Extract a JPEG still from the final video. Failures degrade to `None`.
    async fn extract_thumbnail(
        &self,
        user: &UserData,
        video: &[u8],
        temps: &mut TempSet,
    ) -> Option<Vec<u8>> {
        let work_dir = &self.settings.work_dir;
        let source = match TempResource::write(work_dir, &user.id, "final", "mp4", video).await {
            Ok(res) => temps.track(res),
            Err(e) => {
                tracing::warn!(user_id = %user.id, stage = %Stage::Thumbnail, error = %e, "could not stage video for thumbnail");
                return None;
            }
        };
        let thumb = temps.track(TempResource::reserve(work_dir, &user.id, "thumb", "jpeg"));

        let bytes = match self.ports.transcoder.extract_thumbnail(&source, &thumb).await {
            Ok(()) => tokio::fs::read(&thumb).await.map_err(StageError::from),
            Err(e) => Err(StageError::from(e)),
        };
        match bytes {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                tracing::warn!(user_id = %user.id, stage = %Stage::Thumbnail, "empty thumbnail, continuing without");
                None
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, stage = %Stage::Thumbnail, error = %e, "thumbnail extraction failed, continuing without");
                None
            }
        }
    }

    /// Wait for the store to render a thumbnail. Gives up with an empty
    /// reference after the configured number of polls.
    async fn poll_thumbnail(&self, user: &UserData, object_id: &str) -> String {
        for attempt in 1..=self.settings.poll_attempts {
            match self.ports.store.metadata(object_id).await {
                Ok(meta) => {
                    if let Some(link) = meta.thumbnail_link.filter(|l| !l.is_empty()) {
                        return link;
                    }
                }
                Err(e) => {
                    tracing::debug!(user_id = %user.id, attempt, error = %e, "thumbnail metadata lookup failed");
                }
            }
            if attempt < self.settings.poll_attempts {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }
        tracing::warn!(
            user_id = %user.id,
            stage = %Stage::Thumbnail,
            attempts = self.settings.poll_attempts,
            "thumbnail not ready, continuing without"
        );
        String::new()
    }

    async fn rollback(&self, user: &UserData, uploaded: &[String]) {
        for id in uploaded {
            if let Err(e) = self.ports.store.delete(id).await {
                tracing::warn!(user_id = %user.id, object_id = %id, error = %e, "rollback delete failed");
            }
        }
    }
}
