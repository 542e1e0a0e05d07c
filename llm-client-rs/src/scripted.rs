// llm-client-rs/src/scripted.rs
//
// In-process upstream that replays a fixed sequence of outcomes. Used by the
// pipeline and gateway tests in place of the network client.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::{UpstreamClient, UpstreamResponse};
use crate::error::UpstreamError;

type Outcome = Result<UpstreamResponse, UpstreamError>;

/// Replays outcomes in order; the final outcome repeats once the script runs out
#[derive(Debug)]
pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Outcome>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedUpstream {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call yields the same outcome
    pub fn always(outcome: Outcome) -> Self {
        Self::new(vec![outcome])
    }

    /// Every call yields the given text
    pub fn replying(text: impl Into<String>) -> Self {
        Self::always(Ok(UpstreamResponse::with_text(text)))
    }

    /// Number of `generate` calls observed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    async fn generate(&self, prompt: &str) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        let mut script = self.script.lock().await;
        match script.len() {
            0 => Err(UpstreamError::Service {
                status: 500,
                message: "no scripted outcome".to_string(),
            }),
            1 => script
                .front()
                .cloned()
                .unwrap_or(Err(UpstreamError::MissingText)),
            _ => script
                .pop_front()
                .unwrap_or(Err(UpstreamError::MissingText)),
        }
    }
}
