//! Stateless proxy to an upstream text-generation API.
//!
//! One attempt per request, bounded timeout, and a structured fallback
//! payload for every failure mode — nothing from this module ever
//! propagates as a crash past the HTTP boundary.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Placeholder value shipped in config templates; treated as unconfigured.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// How many insights a successful response carries at most.
const MAX_INSIGHTS: usize = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Request body accepted by the insights endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub temperature_data: TemperatureData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemperatureData {
    #[serde(default)]
    pub current: Vec<f64>,
}

/// Success payload: up to three short insight lines.
#[derive(Debug, Clone, Serialize)]
pub struct InsightReply {
    pub insights: Vec<String>,
    pub success: bool,
}

/// Failure payload: diagnostic plus static fallback lines.
#[derive(Debug, Clone, Serialize)]
pub struct InsightFailure {
    pub error: String,
    pub insights: Vec<String>,
}

/// Insight generation failures.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("API key not configured")]
    Unconfigured,

    #[error("No data provided")]
    EmptyInput,

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl InsightError {
    /// Static fallback lines surfaced alongside the error.
    pub fn fallback_insights(&self) -> Vec<String> {
        match self {
            InsightError::Unconfigured => vec![
                "The text-generation API key is not configured on the server.".to_string(),
                "Set the insight api_key in the server configuration.".to_string(),
                "Insights stay disabled until a key is provided.".to_string(),
            ],
            InsightError::EmptyInput => vec![
                "No temperature data available for analysis. Please upload a data file.".to_string(),
            ],
            InsightError::Upstream(_) => vec![
                "Error generating analysis. Please verify the configured API key.".to_string(),
                "The upstream text-generation service could not be reached.".to_string(),
                "Try again once the upstream service is available.".to_string(),
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct UpstreamRequest {
    contents: Vec<UpstreamContent>,
}

#[derive(Debug, Serialize)]
struct UpstreamContent {
    parts: Vec<UpstreamPart>,
}

#[derive(Debug, Serialize)]
struct UpstreamPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    candidates: Vec<UpstreamCandidate>,
}

#[derive(Debug, Deserialize)]
struct UpstreamCandidate {
    content: UpstreamCandidateContent,
}

#[derive(Debug, Deserialize)]
struct UpstreamCandidateContent {
    #[serde(default)]
    parts: Vec<UpstreamResponsePart>,
}

#[derive(Debug, Deserialize)]
struct UpstreamResponsePart {
    #[serde(default)]
    text: String,
}

/// Client for the upstream generation endpoint.
pub struct InsightClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl InsightClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn configured_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
    }

    /// Generate up to three insight lines for a temperature series.
    ///
    /// Single attempt, no retry; every failure maps to a typed error the
    /// handler renders as a structured fallback payload.
    pub async fn generate(&self, current: &[f64]) -> Result<Vec<String>, InsightError> {
        let key = self.configured_key().ok_or(InsightError::Unconfigured)?;
        if current.is_empty() {
            return Err(InsightError::EmptyInput);
        }

        let prompt = build_prompt(current.len());
        let body = UpstreamRequest {
            contents: vec![UpstreamContent {
                parts: vec![UpstreamPart { text: prompt }],
            }],
        };

        let url = format!("{}?key={}", self.endpoint, key);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InsightError::Upstream(format!(
                "upstream returned {}",
                response.status()
            )));
        }

        let parsed: UpstreamResponse = response
            .json()
            .await
            .map_err(|e| InsightError::Upstream(e.to_string()))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default();

        Ok(extract_insights(&text))
    }
}

fn build_prompt(data_points: usize) -> String {
    format!(
        "You are an expert in industrial temperature monitoring and predictive \
         maintenance systems. A dashboard is showing a series of {} temperature \
         readings.\n\n\
         Provide 3 professional insights about temperature monitoring in \
         industrial equipment (each under 20 words):\n\n\
         1. [General insight about temperature monitoring patterns and importance]\n\
         2. [Insight about temperature threshold management and alerts]\n\
         3. [Recommendation for temperature-based predictive maintenance]\n\n\
         Keep each insight professional, actionable, and under 20 words.",
        data_points
    )
}

/// Pull numbered lines (`1. ...`) out of the upstream text, capped at
/// three. Falls back to the whole text as a single insight when nothing
/// matches.
pub(crate) fn extract_insights(text: &str) -> Vec<String> {
    let numbered: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let mut chars = line.chars();
            let first = chars.next()?;
            if !first.is_ascii_digit() {
                return None;
            }
            let rest = chars.as_str();
            let rest = rest.strip_prefix('.').or_else(|| {
                // Tolerate two-digit numbering.
                rest.strip_prefix(|c: char| c.is_ascii_digit())
                    .and_then(|r| r.strip_prefix('.'))
            })?;
            Some(rest.trim().to_string())
        })
        .filter(|line| !line.is_empty())
        .take(MAX_INSIGHTS)
        .collect();

    if numbered.is_empty() {
        if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![text.trim().to_string()]
        }
    } else {
        numbered
    }
}
