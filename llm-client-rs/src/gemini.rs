// llm-client-rs/src/gemini.rs
//
// HTTP client for the Google Gemini `generateContent` API
//
// Configuration (.env file):
// - GEMINI_API_KEY: API key sent as `x-goog-api-key`
// - GEMINI_API_URL: API base URL (defaults to the public v1beta endpoint)
// - GEMINI_MODEL: Model to use (default: "gemini-2.5-flash")
// - UPSTREAM_TIMEOUT_SECS: Per-request timeout (default: 60)
//
// This client makes exactly one HTTP call per `generate`. Retrying is the
// caller's business.

use std::time::Duration;

use async_trait::async_trait;
use config_rs::UpstreamSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::{UpstreamClient, UpstreamResponse};
use crate::error::{TransportSignal, UpstreamError};

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let texts: Vec<String> = content.parts.into_iter().filter_map(|p| p.text).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        Self::new(
            settings.api_url.clone(),
            settings.model.clone(),
            settings.api_key.clone(),
            settings.timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if the client has credentials
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl UpstreamClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<UpstreamResponse, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("GEMINI_API_KEY is not set".to_string()))?;

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Sending generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                502 | 503 | 504 => UpstreamError::Transport {
                    signal: TransportSignal::ServiceUnavailable,
                    message: format!("Server error ({}): {}", status, text),
                },
                code => UpstreamError::Service {
                    status: code,
                    message: text,
                },
            });
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if let Some(tokens) = data.usage_metadata.as_ref().and_then(|u| u.total_token_count) {
            tracing::info!(model = %self.model, total_tokens = tokens, "Upstream request completed");
        }

        Ok(UpstreamResponse { text: data.text() })
    }
}
