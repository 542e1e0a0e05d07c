// llm-client-rs/src/client.rs
//
// The seam between the pipeline and whatever produces completions.

use async_trait::async_trait;

use crate::error::UpstreamError;

/// Raw result of one upstream call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub text: Option<String>,
}

impl UpstreamResponse {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// A response that carries no text
    pub fn empty() -> Self {
        Self { text: None }
    }

    /// The text payload, or `MissingText` when absent or blank
    pub fn into_text(self) -> Result<String, UpstreamError> {
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(UpstreamError::MissingText),
        }
    }
}

/// A generative text service
///
/// Implementations must be safe to call repeatedly with the same prompt.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<UpstreamResponse, UpstreamError>;
}
