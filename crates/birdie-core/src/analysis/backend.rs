//! Analysis backend trait definition.

use birdie_types::analysis::{AnalysisRequest, AnalyzeResponse};
use birdie_types::error::AnalysisError;

/// Why a single attempt failed.
#[derive(Debug)]
pub enum AttemptError {
    /// The service answered with its "busy, try again shortly" status.
    Busy { status: u16 },
    /// Anything else: not worth retrying.
    Fatal(AnalysisError),
}

/// One HTTP round-trip to the motion-analysis service.
///
/// Implementations do not retry; [`super::client::AnalysisClient`] owns the
/// retry policy.
pub trait AnalysisBackend: Send + Sync {
    fn analyze_once(
        &self,
        request: &AnalysisRequest,
    ) -> impl std::future::Future<Output = Result<AnalyzeResponse, AttemptError>> + Send;

    /// Download a processed video the service returned by reference.
    fn fetch_video(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, AnalysisError>> + Send;
}
