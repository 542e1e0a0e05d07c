//! # Error Classification
//!
//! Domain errors implement [`Classify`] so that their [`ErrorKind`] is fixed
//! where the failure happens. Conversion into [`ClassifiedError`] is then a
//! plain `?`.

use std::error::Error as StdError;

use crate::types::{ClassifiedError, ErrorKind, Violation};

/// A failure that knows its own classification
pub trait Classify: StdError + Send + Sync + 'static {
    /// The kind this failure maps to
    fn kind(&self) -> ErrorKind;

    /// Whether the failure carries a transience signal
    fn is_transient(&self) -> bool {
        false
    }

    /// Structured diagnostic detail
    fn violations(&self) -> Vec<Violation> {
        Vec::new()
    }
}

/// Classifies a domain failure
///
/// The result is retryable only when the failure signals transience and its
/// kind permits retrying.
pub fn classify<E: Classify>(error: E) -> ClassifiedError {
    let kind = error.kind();
    let transient = error.is_transient();
    let details = error.violations();
    let classified = ClassifiedError::new(kind, error.to_string())
        .with_details(details)
        .cause(error);

    if transient {
        classified.transient()
    } else {
        classified
    }
}

impl<E: Classify> From<E> for ClassifiedError {
    fn from(error: E) -> Self {
        classify(error)
    }
}

impl ClassifiedError {
    /// Fallback for failures without a classification of their own
    ///
    /// They are treated as an opaque, non-retryable service failure. The
    /// original message is kept for logging.
    pub fn unclassified<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ClassifiedError::new(ErrorKind::UpstreamUnavailable, error.to_string()).cause(error)
    }
}
