//! # Structured Logging
//!
//! Subscriber bootstrap plus the request span and error logging helpers used
//! by the pipeline and the HTTP layer.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::Span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};
use uuid::Uuid;

use crate::types::{ClassifiedError, ErrorKind};

// Flag to track if logging has been initialized
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Errors raised while installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to set global subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Configuration for the logging system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// The log level to use (trace, debug, info, warn, error)
    pub level: String,
    /// The service name for identification
    pub service_name: String,
    /// Whether to use JSON formatting
    pub json_format: bool,
    /// Directory for a daily rolling log file, if any
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "concept-map-service".to_string(),
            json_format: false,
            log_dir: None,
        }
    }
}

/// Initializes the structured logging system
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is a no-op. When file output is enabled the returned guard must
/// be held for as long as logs should be flushed.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(None);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn", config.level)));

    let json_layer = config.json_format.then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(true)
    });
    let text_layer = (!config.json_format).then(|| fmt::layer().with_target(true));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(
                Rotation::DAILY,
                dir,
                format!("{}.log", config.service_name),
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        LOGGING_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(e.into());
    }

    tracing::info!(
        service = %config.service_name,
        level = %config.level,
        json = config.json_format,
        "Structured logging initialized"
    );

    Ok(guard)
}

/// Creates the span wrapping one pipeline run, tagged with a fresh request id
pub fn request_span(operation: &'static str) -> Span {
    tracing::info_span!("request", operation, request_id = %Uuid::new_v4())
}

/// Logs a classified error with its internal detail
///
/// Client defects are logged as warnings, upstream failures as errors.
pub fn log_classified_error(error: &ClassifiedError) {
    let cause = error
        .cause
        .as_ref()
        .map(|c| c.to_string())
        .unwrap_or_default();

    match error.kind {
        ErrorKind::RequestInvalid => {
            tracing::warn!(
                error_kind = error.kind.code(),
                message = %error.message,
                "Request rejected"
            );
        }
        _ => {
            tracing::error!(
                error_kind = error.kind.code(),
                message = %error.message,
                retryable = error.retryable,
                cause = %cause,
                details = ?error.details,
                "Error occurred"
            );
        }
    }
}
