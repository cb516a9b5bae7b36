//! AnalysisClient -- bounded retry around an [`AnalysisBackend`].
//!
//! Only the backend's "busy" status is retried. Every other failure is
//! terminal on the attempt that produced it. The outcome records how many
//! attempts were made so callers (and tests) can assert on it directly.

use std::time::Duration;

use birdie_types::analysis::{AnalysisRequest, AnalysisResult};
use birdie_types::config::{AnalysisConfig, Backoff};
use birdie_types::error::AnalysisError;

use super::backend::{AnalysisBackend, AttemptError};

/// Status code the analysis gateway uses for "overloaded, retry shortly".
pub const BUSY_STATUS: u16 = 502;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
            backoff: config.backoff,
        }
    }

    /// Wait before attempt `next` (2-based: the first attempt never waits).
    pub fn delay_before(&self, next: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let exp = next.saturating_sub(2).min(16);
                self.delay.saturating_mul(1u32 << exp)
            }
        }
    }
}

/// Terminal state of a retry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Succeeded,
    /// Busy on every attempt up to the cap.
    FailedTransient,
    FailedFatal,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub attempts: u32,
    pub status: TerminalStatus,
    pub result: Result<AnalysisResult, AnalysisError>,
}

pub struct AnalysisClient<B: AnalysisBackend> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: AnalysisBackend> AnalysisClient<B> {
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Submit a video, retrying while the service reports busy.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let mut attempt = 1;
        loop {
            match self.backend.analyze_once(request).await {
                Ok(response) => {
                    let result = AnalysisResult::try_from(response);
                    let status = if result.is_ok() {
                        TerminalStatus::Succeeded
                    } else {
                        TerminalStatus::FailedFatal
                    };
                    return AnalysisOutcome {
                        attempts: attempt,
                        status,
                        result,
                    };
                }
                Err(AttemptError::Busy { status }) if attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_before(attempt + 1);
                    tracing::warn!(
                        attempt,
                        status,
                        delay_ms = delay.as_millis() as u64,
                        "analysis service busy, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AttemptError::Busy { status }) => {
                    tracing::warn!(attempt, status, "analysis service still busy, giving up");
                    return AnalysisOutcome {
                        attempts: attempt,
                        status: TerminalStatus::FailedTransient,
                        result: Err(AnalysisError::Busy { attempts: attempt }),
                    };
                }
                Err(AttemptError::Fatal(e)) => {
                    return AnalysisOutcome {
                        attempts: attempt,
                        status: TerminalStatus::FailedFatal,
                        result: Err(e),
                    };
                }
            }
        }
    }

    pub async fn fetch_video(&self, url: &str) -> Result<Vec<u8>, AnalysisError> {
        self.backend.fetch_video(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Scripted, ScriptedBackend, no_wait};
    use birdie_types::skill::{Handedness, Skill};
    use std::sync::atomic::Ordering;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            video: b"video".to_vec(),
            filename: "U1_lift_2024-01-01-00-00.mp4".into(),
            handedness: Handedness::Right,
            skill: Skill::Lift,
        }
    }

    #[tokio::test]
    async fn test_busy_twice_then_success_uses_third_attempt() {
        let backend = ScriptedBackend::new(vec![
            Scripted::Busy,
            Scripted::Busy,
            Scripted::Ok(ScriptedBackend::ok_response("91", &["Keep elbow high"])),
        ]);
        let client = AnalysisClient::new(backend, no_wait());

        let outcome = client.analyze(&request()).await;
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.status, TerminalStatus::Succeeded);
        let result = outcome.result.unwrap();
        assert_eq!(result.score, 91.0);
        assert_eq!(result.ai_note(), "1. Keep elbow high");
    }

    #[tokio::test]
    async fn test_busy_stops_at_cap() {
        let backend = ScriptedBackend::new(vec![Scripted::Busy]);
        let client = AnalysisClient::new(backend, no_wait());

        let outcome = client.analyze(&request()).await;
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.status, TerminalStatus::FailedTransient);
        assert!(matches!(outcome.result, Err(AnalysisError::Busy { attempts: 3 })));
        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_status_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Scripted::Status(503), Scripted::Busy]);
        let client = AnalysisClient::new(backend, no_wait());

        let outcome = client.analyze(&request()).await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.status, TerminalStatus::FailedFatal);
        assert!(matches!(outcome.result, Err(AnalysisError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_transport_error_after_busy_is_fatal() {
        let backend = ScriptedBackend::new(vec![Scripted::Busy, Scripted::Transport]);
        let client = AnalysisClient::new(backend, no_wait());

        let outcome = client.analyze(&request()).await;
        assert_eq!(outcome.attempts, 2);
        assert!(matches!(outcome.result, Err(AnalysisError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unparseable_score_is_fatal_without_retry() {
        let backend = ScriptedBackend::new(vec![Scripted::Ok(ScriptedBackend::ok_response(
            "n/a",
            &[],
        ))]);
        let client = AnalysisClient::new(backend, no_wait());

        let outcome = client.analyze(&request()).await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.status, TerminalStatus::FailedFatal);
        assert!(matches!(outcome.result, Err(AnalysisError::InvalidResponse(_))));
    }

    #[test]
    fn test_backoff_delays() {
        let fixed = RetryPolicy {
            delay: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        assert_eq!(fixed.delay_before(2), Duration::from_secs(5));
        assert_eq!(fixed.delay_before(3), Duration::from_secs(5));

        let exp = RetryPolicy {
            backoff: Backoff::Exponential,
            ..fixed
        };
        assert_eq!(exp.delay_before(2), Duration::from_secs(5));
        assert_eq!(exp.delay_before(3), Duration::from_secs(10));
        assert_eq!(exp.delay_before(4), Duration::from_secs(20));
    }

    #[test]
    fn test_policy_from_config_enforces_one_attempt() {
        let config = AnalysisConfig {
            max_attempts: 0,
            ..AnalysisConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }
}
