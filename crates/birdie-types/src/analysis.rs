//! Motion-analysis request and response types.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AnalysisError;
use crate::skill::{Handedness, Skill};

/// Shown instead of an empty suggestion list.
pub const NO_ADJUSTMENT_NEEDED: &str = "Your form looks good. No adjustment needed.";

/// One submission to the analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub video: Vec<u8>,
    pub filename: String,
    pub handedness: Handedness,
    pub skill: Skill,
}

/// Wire shape of a successful `/analyze` response.
///
/// `score` arrives as a numeric string in most deployments and as a bare
/// number in others; both are accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub skeleton_video: String,
    #[serde(deserialize_with = "score_from_string_or_number")]
    pub score: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

fn score_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Text(String),
        Number(f64),
    }

    Ok(match Score::deserialize(deserializer)? {
        Score::Text(s) => s,
        Score::Number(n) => n.to_string(),
    })
}

/// Where the processed ("skeleton") video lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkeletonVideo {
    /// Decoded payload returned inline.
    Inline(Vec<u8>),
    /// External link to fetch.
    Remote(String),
    /// The service returned nothing; the submitted video is kept.
    Absent,
}

/// Parsed, validated analysis result.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub score: f32,
    pub suggestions: Vec<String>,
    pub skeleton: SkeletonVideo,
}

impl AnalysisResult {
    /// Suggestions formatted for storage and display.
    pub fn ai_note(&self) -> String {
        normalize_suggestions(&self.suggestions).join("\n")
    }
}

impl TryFrom<AnalyzeResponse> for AnalysisResult {
    type Error = AnalysisError;

    fn try_from(resp: AnalyzeResponse) -> Result<Self, Self::Error> {
        let score: f32 = resp.score.trim().parse().map_err(|e| {
            AnalysisError::InvalidResponse(format!("score '{}' is not numeric: {e}", resp.score))
        })?;
        if !score.is_finite() {
            return Err(AnalysisError::InvalidResponse(format!(
                "score '{}' is not finite",
                resp.score
            )));
        }

        let raw = resp.skeleton_video.trim();
        let skeleton = if raw.is_empty() {
            SkeletonVideo::Absent
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            SkeletonVideo::Remote(raw.to_string())
        } else {
            use base64::Engine as _;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(raw)
                .map_err(|e| AnalysisError::InvalidResponse(format!("skeleton video: {e}")))?;
            SkeletonVideo::Inline(bytes)
        };

        Ok(Self {
            score,
            suggestions: resp.suggestions,
            skeleton,
        })
    }
}

/// Prefix each suggestion with its 1-based ordinal; an empty list becomes
/// the single [`NO_ADJUSTMENT_NEEDED`] message.
pub fn normalize_suggestions(suggestions: &[String]) -> Vec<String> {
    if suggestions.is_empty() {
        return vec![NO_ADJUSTMENT_NEEDED.to_string()];
    }
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect()
}
