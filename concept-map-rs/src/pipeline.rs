//! Concept map pipeline
//!
//! Composes the stages that turn a request into a validated [`ConceptMap`]:
//!
//! 1. request validation and prompt construction
//! 2. the upstream call, wrapped in the [`RetryPolicy`]
//! 3. sanitization, schema validation and integrity checking
//!
//! Only the upstream call is retried. A response that fails validation is
//! final for that request.

use std::sync::Arc;

use error_handling_rs::{log_classified_error, request_span, ClassifiedError, RetryPolicy};
use llm_client_rs::UpstreamClient;
use tracing::{info, Instrument};

use crate::integrity::check_integrity;
use crate::model::{ConceptMap, ConceptMapRequest};
use crate::prompt::build_prompt;
use crate::sanitizer::sanitize;
use crate::schema::validate;

/// Produces validated concept maps from an upstream generative service
#[derive(Clone)]
pub struct ConceptMapPipeline {
    upstream: Arc<dyn UpstreamClient>,
    retry: RetryPolicy,
}

impl ConceptMapPipeline {
    pub fn new(upstream: Arc<dyn UpstreamClient>, retry: RetryPolicy) -> Self {
        Self { upstream, retry }
    }

    /// Generates and validates a dependency map for `request`
    ///
    /// Every failure comes back classified; it is logged here with its
    /// internal detail before being returned.
    pub async fn generate_dependency_map(
        &self,
        request: &ConceptMapRequest,
    ) -> Result<ConceptMap, ClassifiedError> {
        async {
            let result = self.run(request).await;
            if let Err(error) = &result {
                log_classified_error(error);
            }
            result
        }
        .instrument(request_span("generate_dependency_map"))
        .await
    }

    async fn run(&self, request: &ConceptMapRequest) -> Result<ConceptMap, ClassifiedError> {
        let prompt = build_prompt(request)?;
        info!(
            concept = request.concept().unwrap_or_default(),
            level = request.level().unwrap_or_default(),
            subject = request.subject().unwrap_or_default(),
            "Generating concept map"
        );

        let upstream = self.upstream.as_ref();
        let prompt = prompt.as_str();
        let raw = self
            .retry
            .execute("upstream.generate", || fetch_text(upstream, prompt))
            .await?;

        let map = check_integrity(validate(sanitize(&raw))?)?;

        info!(
            target_concept = %map.target,
            nodes = map.prerequisites.len(),
            "Concept map validated"
        );
        Ok(map)
    }
}

/// One upstream attempt; a response without text is a final failure
async fn fetch_text(upstream: &dyn UpstreamClient, prompt: &str) -> Result<String, ClassifiedError> {
    let response = upstream.generate(prompt).await?;
    Ok(response.into_text()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use error_handling_rs::ErrorKind;
    use llm_client_rs::{ScriptedUpstream, UpstreamError, UpstreamResponse};
    use tokio::time::Instant;

    use crate::model::Level;

    const REACT_MAP: &str = r#"{"target":"React","prerequisites":[{"id":1,"name":"JavaScript","description":"Learn JS","prerequisites":[],"level":"foundational"}]}"#;

    fn pipeline(upstream: &Arc<ScriptedUpstream>) -> ConceptMapPipeline {
        ConceptMapPipeline::new(upstream.clone(), RetryPolicy::default())
    }

    fn refused() -> Result<UpstreamResponse, UpstreamError> {
        Err(UpstreamError::connection_refused("connect ECONNREFUSED 127.0.0.1:443"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fenced_response_is_unwrapped_and_validated() {
        let upstream = Arc::new(ScriptedUpstream::replying(format!("```json\n{}\n```", REACT_MAP)));

        let map = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap();

        assert_eq!(map.target, "React");
        assert_eq!(map.prerequisites[0].name, "JavaScript");
        assert_eq!(map.prerequisites[0].level, Level::Foundational);
        assert_eq!(upstream.calls(), 1);

        let prompts = upstream.prompts().await;
        assert!(prompts[0].contains("\"React\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_concept_never_calls_upstream() {
        let upstream = Arc::new(ScriptedUpstream::replying(REACT_MAP));

        let err = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::RequestInvalid);
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.public_message(), "concept input required to generate concept map.");
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_text_is_not_retried() {
        let upstream = Arc::new(ScriptedUpstream::always(Ok(UpstreamResponse::empty())));
        let start = Instant::now();

        let err = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamMalformed);
        assert_eq!(err.http_status(), 502);
        assert!(!err.retryable);
        assert_eq!(upstream.calls(), 1);
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_json_is_not_retried() {
        let upstream = Arc::new(ScriptedUpstream::replying("invalid json {"));

        let err = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamResponseInvalid);
        assert_eq!(err.public_message(), "Invalid response from AI service");
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_and_integrity_failures() {
        let bodies = [
            r#"{"prerequisites":[{"id":1,"name":"JS","description":"d","level":"foundational"}]}"#,
            r#"{"target":"React","prerequisites":[{"id":1,"name":"JS","description":"d","level":"expert"}]}"#,
            r#"{"target":"React","prerequisites":[{"id":1,"name":"JS","description":"d","prerequisites":[7],"level":"advanced"}]}"#,
        ];

        for body in bodies {
            let upstream = Arc::new(ScriptedUpstream::replying(body));
            let err = pipeline(&upstream)
                .generate_dependency_map(&ConceptMapRequest::new("React"))
                .await
                .unwrap_err();

            assert_eq!(err.kind, ErrorKind::UpstreamResponseInvalid, "body: {}", body);
            assert!(!err.details.is_empty());
            assert_eq!(upstream.calls(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let upstream = Arc::new(ScriptedUpstream::new(vec![
            refused(),
            Err(UpstreamError::timed_out("Request timeout")),
            Ok(UpstreamResponse::with_text(REACT_MAP)),
        ]));
        let start = Instant::now();

        let map = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap();

        assert_eq!(map.target, "React");
        assert_eq!(upstream.calls(), 3);
        // 1000ms before the first retry, 2000ms before the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let upstream = Arc::new(ScriptedUpstream::always(refused()));

        let err = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
        assert_eq!(err.http_status(), 503);
        assert_eq!(err.public_message(), "AI Service temporarily unavailable");
        assert_eq!(upstream.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_makes_one_attempt() {
        let upstream = Arc::new(ScriptedUpstream::always(refused()));
        let pipeline = ConceptMapPipeline::new(upstream.clone(), RetryPolicy::new(0, Duration::from_millis(1000)));

        let err = pipeline
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opaque_service_failure_is_not_retried() {
        let upstream = Arc::new(ScriptedUpstream::always(Err(UpstreamError::Service {
            status: 400,
            message: "API key not valid".to_string(),
        })));

        let err = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
        assert!(!err.retryable);
        assert!(err.message.contains("API key not valid"));
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_response_is_final() {
        // A malformed first response is final even if a good one would follow
        let upstream = Arc::new(ScriptedUpstream::new(vec![
            Ok(UpstreamResponse::with_text("not json")),
            Ok(UpstreamResponse::with_text(REACT_MAP)),
        ]));

        let err = pipeline(&upstream)
            .generate_dependency_map(&ConceptMapRequest::new("React"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamResponseInvalid);
        assert_eq!(upstream.calls(), 1);
    }
}
