// concept-map-rs/src/error.rs
//
// Domain failures of the concept-map pipeline. Each one fixes its own
// classification, so stages can simply use `?`.

use error_handling_rs::{Classify, ErrorKind, Violation};
use thiserror::Error;

/// Message returned when a request carries no usable concept
pub const MISSING_CONCEPT_MESSAGE: &str = "concept input required to generate concept map.";

/// Defects in the caller's request, detected before any upstream call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("concept input required to generate concept map.")]
    MissingConcept,
}

impl Classify for RequestError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::RequestInvalid
    }
}

/// Defects in the text the upstream service returned
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("Upstream text is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Upstream JSON does not match the concept map shape ({} violation(s))", .0.len())]
    Schema(Vec<Violation>),

    #[error("Invalid dependency: prerequisite {missing} referenced but not found")]
    DanglingReference { node: u64, missing: u64 },

    #[error("Invalid dependency: node id {0} is declared more than once")]
    DuplicateId(u64),
}

impl Classify for ResponseError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::UpstreamResponseInvalid
    }

    fn violations(&self) -> Vec<Violation> {
        match self {
            ResponseError::Parse(e) => vec![Violation::new(
                "",
                format!("line {} column {}: {}", e.line(), e.column(), e),
            )],
            ResponseError::Schema(violations) => violations.clone(),
            ResponseError::DanglingReference { node, missing } => vec![Violation::new(
                format!("/prerequisites[id={}]/prerequisites", node),
                format!("references unknown id {}", missing),
            )],
            ResponseError::DuplicateId(id) => vec![Violation::new(
                format!("/prerequisites[id={}]", id),
                "duplicate id",
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_handling_rs::ClassifiedError;

    #[test]
    fn test_missing_concept_is_request_invalid() {
        let err: ClassifiedError = RequestError::MissingConcept.into();
        assert_eq!(err.kind, ErrorKind::RequestInvalid);
        assert!(!err.retryable);
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.public_message(), MISSING_CONCEPT_MESSAGE);
    }

    #[test]
    fn test_response_errors_are_invalid_and_final() {
        let parse = serde_json::from_str::<serde_json::Value>("invalid json {").unwrap_err();
        let errors = vec![
            ResponseError::Parse(parse),
            ResponseError::Schema(vec![Violation::new("/target", "is required")]),
            ResponseError::DanglingReference { node: 2, missing: 99 },
            ResponseError::DuplicateId(1),
        ];

        for error in errors {
            let err: ClassifiedError = error.into();
            assert_eq!(err.kind, ErrorKind::UpstreamResponseInvalid);
            assert!(!err.retryable);
            assert_eq!(err.http_status(), 502);
            assert_eq!(err.public_message(), "Invalid response from AI service");
            assert!(!err.details.is_empty());
        }
    }

    #[test]
    fn test_dangling_reference_message() {
        let err = ResponseError::DanglingReference { node: 2, missing: 99 };
        assert_eq!(
            err.to_string(),
            "Invalid dependency: prerequisite 99 referenced but not found"
        );
    }
}
