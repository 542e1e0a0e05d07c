//! # Error Handling Framework
//!
//! Error taxonomy, classification, retry and logging for the concept-map
//! service.
//!
//! ## Features
//!
//! - A closed error taxonomy bound to fixed HTTP statuses
//! - Classification at the failure site through the [`Classify`] trait
//! - Bounded retries with exponential backoff
//! - Structured logging bootstrap
//!

pub mod classify;
pub mod logging;
pub mod retry;
pub mod types;

// Re-export commonly used types
pub use classify::{classify, Classify};
pub use logging::{init_logging, log_classified_error, request_span, LoggingConfig, LoggingError};
pub use retry::{execute_with_retry, RetryPolicy, RetryState, RetryableError};
pub use types::{
    ClassifiedError, ErrorKind, Result, Violation, INVALID_RESPONSE_MESSAGE, UNAVAILABLE_MESSAGE,
};
