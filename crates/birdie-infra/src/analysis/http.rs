//! HttpAnalysisBackend -- one `POST /analyze` round-trip per call.
//!
//! Retries are not handled here; the core `AnalysisClient` decides whether
//! a [`AttemptError::Busy`] is worth another attempt.

use std::time::Duration;

use birdie_core::analysis::backend::{AnalysisBackend, AttemptError};
use birdie_core::analysis::client::BUSY_STATUS;
use birdie_types::analysis::{AnalysisRequest, AnalyzeResponse};
use birdie_types::error::AnalysisError;
use secrecy::{ExposeSecret, SecretString};

/// Basic-auth credentials for the analysis service.
pub struct AnalysisCredentials {
    pub user: String,
    pub password: SecretString,
}

pub struct HttpAnalysisBackend {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<AnalysisCredentials>,
}

impl HttpAnalysisBackend {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Option<AnalysisCredentials>,
    ) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn analyze_url(&self) -> String {
        format!("{}/analyze", self.base_url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(c) => builder.basic_auth(&c.user, Some(c.password.expose_secret())),
            None => builder,
        }
    }
}

/// Sort a non-success status into busy (retryable) or fatal.
pub(crate) fn classify_status(status: u16, body: String) -> AttemptError {
    if status == BUSY_STATUS {
        AttemptError::Busy { status }
    } else {
        AttemptError::Fatal(AnalysisError::Status { status, body })
    }
}

impl AnalysisBackend for HttpAnalysisBackend {
    async fn analyze_once(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse, AttemptError> {
        let part = reqwest::multipart::Part::bytes(request.video.clone())
            .file_name(request.filename.clone())
            .mime_str("video/mp4")
            .map_err(|e| AttemptError::Fatal(AnalysisError::Transport(e.to_string())))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let builder = self
            .client
            .post(self.analyze_url())
            .query(&[
                ("handedness", request.handedness.as_str()),
                ("skill", request.skill.as_str()),
            ])
            .multipart(form);

        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| AttemptError::Fatal(AnalysisError::Transport(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "analysis service rejected request");
            return Err(classify_status(status.as_u16(), body));
        }

        response
            .json::<AnalyzeResponse>()
            .await
            .map_err(|e| AttemptError::Fatal(AnalysisError::InvalidResponse(e.to_string())))
    }

    async fn fetch_video(&self, url: &str) -> Result<Vec<u8>, AnalysisError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
