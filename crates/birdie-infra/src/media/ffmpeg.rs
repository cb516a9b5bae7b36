//! FfmpegTranscoder -- [`Transcoder`] backed by the `ffmpeg` binary.
//!
//! Argument lists are built by pure functions so they can be checked without
//! spawning a process.

use std::ffi::OsString;
use std::path::Path;

use birdie_core::media::transcoder::Transcoder;
use birdie_types::config::PipelineConfig;
use birdie_types::error::TranscodeError;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    width: u32,
    height: u32,
    bitrate: String,
    threads: u32,
    thumbnail_offset: String,
    thumbnail_width: u32,
}

impl FfmpegTranscoder {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            program: "ffmpeg".to_string(),
            width: config.target_width,
            height: config.target_height,
            bitrate: config.video_bitrate.clone(),
            threads: config.encode_threads.max(1),
            thumbnail_offset: config.thumbnail_offset.clone(),
            thumbnail_width: config.thumbnail_width,
        }
    }

    /// Use a different executable (a full path, or a wrapper script).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub(crate) fn resize_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
        args.extend(
            [
                "-vf".to_string(),
                format!("scale={}:{}", self.width, self.height),
                "-b:v".to_string(),
                self.bitrate.clone(),
                "-threads".to_string(),
                self.threads.to_string(),
                "-an".to_string(),
                "-vsync".to_string(),
                "0".to_string(),
            ]
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    pub(crate) fn thumbnail_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-ss".into(),
            self.thumbnail_offset.clone().into(),
            "-i".into(),
            input.into(),
        ];
        args.extend(
            [
                "-vframes".to_string(),
                "1".to_string(),
                "-vcodec".to_string(),
                "mjpeg".to_string(),
                "-vf".to_string(),
                format!("scale={}:-1", self.thumbnail_width),
            ]
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), TranscodeError> {
        tracing::debug!(program = %self.program, ?args, "running transcoder");
        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TranscodeError::NotAvailable(self.program.clone()),
                _ => TranscodeError::Io(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // ffmpeg prints its banner first; the cause is at the end.
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(TranscodeError::Failed {
                code: output.status.code(),
                stderr: tail,
            });
        }
        Ok(())
    }
}

impl Transcoder for FfmpegTranscoder {
    async fn resize(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.run(self.resize_args(input, output)).await
    }

    async fn extract_thumbnail(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.run(self.thumbnail_args(input, output)).await
    }
}

/// Verify the transcoder binary can be launched.
pub async fn check_ffmpeg_available(program: &str) -> Result<String, TranscodeError> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .await
        .map_err(|_| TranscodeError::NotAvailable(program.to_string()))?;
    if !output.status.success() {
        return Err(TranscodeError::NotAvailable(program.to_string()));
    }
    let version = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();
    Ok(version)
}
