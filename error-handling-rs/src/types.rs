//! # Classified Error Types
//!
//! A single flat error type for the concept-map pipeline. Every failure that
//! reaches the HTTP boundary carries exactly one [`ErrorKind`], which fixes
//! its retry eligibility and its externally-visible status and message.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A type alias for Result with the error type defaulting to [`ClassifiedError`]
pub type Result<T, E = ClassifiedError> = std::result::Result<T, E>;

/// Message returned to callers for unusable upstream content
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from AI service";

/// Message returned to callers when the upstream service cannot be reached
pub const UNAVAILABLE_MESSAGE: &str = "AI Service temporarily unavailable";

/// The closed set of failure classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Client input defect, detected before any upstream call
    RequestInvalid,
    /// Transport or service failure of the upstream call
    UpstreamUnavailable,
    /// Upstream answered without any text content
    UpstreamMalformed,
    /// Upstream text failed parsing, schema or structural validation
    UpstreamResponseInvalid,
}

impl ErrorKind {
    /// HTTP status bound to this kind
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::RequestInvalid => 400,
            ErrorKind::UpstreamMalformed | ErrorKind::UpstreamResponseInvalid => 502,
            ErrorKind::UpstreamUnavailable => 503,
        }
    }

    /// Only upstream transport failures may ever be retried
    pub fn permits_retry(self) -> bool {
        matches!(self, ErrorKind::UpstreamUnavailable)
    }

    /// Stable machine-readable code, used in logs
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::RequestInvalid => "REQUEST_INVALID",
            ErrorKind::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorKind::UpstreamMalformed => "UPSTREAM_MALFORMED",
            ErrorKind::UpstreamResponseInvalid => "UPSTREAM_RESPONSE_INVALID",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::RequestInvalid => write!(f, "Request Invalid"),
            ErrorKind::UpstreamUnavailable => write!(f, "Upstream Unavailable"),
            ErrorKind::UpstreamMalformed => write!(f, "Upstream Malformed"),
            ErrorKind::UpstreamResponseInvalid => write!(f, "Upstream Response Invalid"),
        }
    }
}

/// One schema or structure problem found in an upstream payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Location inside the payload, e.g. `/prerequisites/0/level`
    pub path: String,
    /// What is wrong at that location
    pub reason: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// Core error type of the pipeline
///
/// `message` is the internal description. What a caller may see is decided
/// by [`ClassifiedError::public_message`].
#[derive(Debug)]
pub struct ClassifiedError {
    /// The classification of this failure
    pub kind: ErrorKind,
    /// Internal, human-readable description
    pub message: String,
    /// Whether the retry policy may repeat the failed operation
    pub retryable: bool,
    /// Diagnostic detail, never exposed to callers
    pub details: Vec<Violation>,
    /// The original error
    pub cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl Clone for ClassifiedError {
    /// Clones keep all structured data but drop the opaque `cause`.
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            retryable: self.retryable,
            details: self.details.clone(),
            cause: None,
        }
    }
}

impl ClassifiedError {
    /// Creates a non-retryable error of the given kind
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
            details: Vec::new(),
            cause: None,
        }
    }

    /// Marks this error as transient. Ignored for kinds that never retry.
    pub fn transient(mut self) -> Self {
        self.retryable = self.kind.permits_retry();
        self
    }

    /// Attaches diagnostic violations
    pub fn with_details(mut self, details: Vec<Violation>) -> Self {
        self.details = details;
        self
    }

    /// Chains this error with its cause
    pub fn cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    /// HTTP status for this error
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    /// The message a caller is allowed to see
    ///
    /// Request validation messages pass through verbatim; upstream failures
    /// collapse to a fixed text so no upstream detail leaks.
    pub fn public_message(&self) -> &str {
        match self.kind {
            ErrorKind::RequestInvalid => &self.message,
            ErrorKind::UpstreamMalformed | ErrorKind::UpstreamResponseInvalid => {
                INVALID_RESPONSE_MESSAGE
            }
            ErrorKind::UpstreamUnavailable => UNAVAILABLE_MESSAGE,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if self.retryable {
            write!(f, " (retryable)")?;
        }
        Ok(())
    }
}

impl StdError for ClassifiedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
