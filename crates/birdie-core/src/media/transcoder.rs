//! Transcoder trait definition.

use std::path::Path;

use birdie_types::error::TranscodeError;

/// External video tool (ffmpeg in production).
///
/// Both operations read `input` and write a new file at `output`; neither
/// deletes its input.
pub trait Transcoder: Send + Sync {
    /// Resize and re-encode to the analysis resolution, stripping audio.
    fn resize(
        &self,
        input: &Path,
        output: &Path,
    ) -> impl std::future::Future<Output = Result<(), TranscodeError>> + Send;

    /// Extract one still frame as a JPEG.
    fn extract_thumbnail(
        &self,
        input: &Path,
        output: &Path,
    ) -> impl std::future::Future<Output = Result<(), TranscodeError>> + Send;
}
