//! Application configuration types.
//!
//! `AppConfig` represents the top-level `config.toml`. Every section has
//! defaults, so an empty file (or no file) yields a runnable configuration;
//! credentials never live here and are read from the environment.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::skill::{Handedness, Skill};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub drive: DriveConfig,

    /// Demonstration video links, keyed by handedness then skill wire name.
    #[serde(default)]
    pub expert_videos: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    #[serde(default)]
    pub syllabus_url: Option<String>,

    /// JPEG/PNG shown as the video preview for entries without a thumbnail.
    #[serde(default)]
    pub preview_placeholder_url: Option<String>,
}

impl AppConfig {
    pub fn expert_videos_for(&self, handedness: Handedness, skill: Skill) -> &[String] {
        self.expert_videos
            .get(handedness.as_str())
            .and_then(|m| m.get(skill.as_str()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long shutdown waits for in-flight event handling to finish.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_grace_secs: 120,
        }
    }
}

/// How a thumbnail for an uploaded video is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailStrategy {
    /// Extract a still frame locally and upload it alongside the video.
    #[default]
    Extract,
    /// Let the object store render one and poll until it appears.
    PollStore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory for temporary artifacts. Defaults to the OS temp dir.
    pub work_dir: Option<PathBuf>,
    pub target_width: u32,
    pub target_height: u32,
    pub video_bitrate: String,
    pub encode_threads: u32,
    /// Offset into the clip for the thumbnail frame (`HH:MM:SS`).
    pub thumbnail_offset: String,
    pub thumbnail_width: u32,
    pub thumbnail_strategy: ThumbnailStrategy,
    pub thumbnail_poll_attempts: u32,
    pub thumbnail_poll_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            target_width: 1080,
            target_height: 1920,
            video_bitrate: "1M".to_string(),
            encode_threads: 1,
            thumbnail_offset: "00:00:01".to_string(),
            thumbnail_width: 320,
            thumbnail_strategy: ThumbnailStrategy::Extract,
            thumbnail_poll_attempts: 40,
            thumbnail_poll_interval_ms: 1_000,
        }
    }
}

impl PipelineConfig {
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub backoff: Backoff,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            max_attempts: 3,
            retry_delay_ms: 5_000,
            backoff: Backoff::Fixed,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Parent folder under which per-user folders are created.
    pub root_folder_id: String,
}
