//! Application state wiring the adapters into the conversation layer.
//!
//! The core services are generic over a [`Backends`] bundle; `ProdBackends`
//! pins them to the birdie-infra adapters.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use tokio_util::task::TaskTracker;

use birdie_core::analysis::client::{AnalysisClient, RetryPolicy};
use birdie_core::conversation::guard::IngestionGuard;
use birdie_core::conversation::router::EventRouter;
use birdie_core::conversation::session::SessionService;
use birdie_core::pipeline::ingest::{PipelineSettings, VideoIngestionPipeline};
use birdie_core::ports::{Backends, Ports};
use birdie_infra::analysis::http::{AnalysisCredentials, HttpAnalysisBackend};
use birdie_infra::drive::auth::ServiceAccountTokens;
use birdie_infra::drive::client::DriveObjectStore;
use birdie_infra::line::client::LineMessagingClient;
use birdie_infra::media::ffmpeg::FfmpegTranscoder;
use birdie_infra::secret::env::EnvSecrets;
use birdie_infra::sqlite::document::DocumentStore;
use birdie_infra::sqlite::pool::{DatabasePool, data_dir, default_database_url};
use birdie_infra::sqlite::session::SqliteSessionRepository;
use birdie_infra::sqlite::user::SqliteUserRepository;
use birdie_types::config::AppConfig;

pub struct ProdBackends;

impl Backends for ProdBackends {
    type Messaging = LineMessagingClient;
    type Users = SqliteUserRepository;
    type Sessions = SqliteSessionRepository;
    type Store = DriveObjectStore;
    type Transcoder = FfmpegTranscoder;
    type Analysis = HttpAnalysisBackend;
}

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EventRouter<ProdBackends>>,
    pub channel_secret: Arc<SecretString>,
    pub config: Arc<AppConfig>,
    pub db_pool: DatabasePool,
    /// Background event handling spawned by the webhook.
    pub tasks: TaskTracker,
}

impl AppState {
    /// Open the database in the data directory and wire every service.
    pub async fn init(config: AppConfig, secrets: EnvSecrets) -> anyhow::Result<Self> {
        let data_dir = data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        let db_pool = DatabasePool::new(&default_database_url())
            .await
            .context("failed to open database")?;
        Self::with_pool(config, secrets, db_pool).await
    }

    pub async fn with_pool(
        config: AppConfig,
        secrets: EnvSecrets,
        db_pool: DatabasePool,
    ) -> anyhow::Result<Self> {
        let work_dir = config.pipeline.work_dir();
        tokio::fs::create_dir_all(&work_dir)
            .await
            .with_context(|| format!("failed to create {}", work_dir.display()))?;

        let docs = DocumentStore::new(db_pool.clone());
        let credentials = match (secrets.genai_user, secrets.genai_password) {
            (Some(user), Some(password)) => Some(AnalysisCredentials { user, password }),
            _ => None,
        };
        let analysis = HttpAnalysisBackend::new(
            config.analysis.base_url.clone(),
            Duration::from_secs(config.analysis.timeout_secs),
            credentials,
        )?;

        let ports = Arc::new(Ports {
            messaging: LineMessagingClient::new(secrets.line_channel_token)?,
            users: SqliteUserRepository::new(docs.clone()),
            sessions: SessionService::new(SqliteSessionRepository::new(docs)),
            store: DriveObjectStore::new(
                ServiceAccountTokens::from_credentials(&secrets.drive_credentials)
                    .context("failed to load Drive service account key")?,
            )?,
            transcoder: FfmpegTranscoder::new(&config.pipeline),
            analysis: AnalysisClient::new(analysis, RetryPolicy::from_config(&config.analysis)),
        });
        let pipeline =
            VideoIngestionPipeline::new(Arc::clone(&ports), PipelineSettings::from(&config.pipeline));

        let config = Arc::new(config);
        let router = EventRouter::new(ports, pipeline, IngestionGuard::new(), Arc::clone(&config));

        tracing::debug!(work_dir = %work_dir.display(), "application state initialized");
        Ok(Self {
            router: Arc::new(router),
            channel_secret: Arc::new(secrets.line_channel_secret),
            config,
            db_pool,
            tasks: TaskTracker::new(),
        })
    }

    /// Stop accepting background work and wait up to `grace` for what is
    /// running. Returns false if tasks were still running at the deadline.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tasks.close();
        let pending = self.tasks.len();
        if pending > 0 {
            tracing::info!(pending, "waiting for in-flight events");
        }
        match tokio::time::timeout(grace, self.tasks.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    pending = self.tasks.len(),
                    grace_secs = grace.as_secs(),
                    "shutdown grace period elapsed with events still running"
                );
                false
            }
        }
    }
}
