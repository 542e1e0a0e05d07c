// llm-client-rs/src/error.rs
//
// Failures of the upstream call, each classified where it is raised.

use std::fmt;

use error_handling_rs::{Classify, ErrorKind};

/// Machine-readable transport condition reported by the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSignal {
    /// The request or connection timed out
    TimedOut,
    /// The connection could not be established
    ConnectionRefused,
    /// A gateway or the service itself reported it is unavailable (502/503/504)
    ServiceUnavailable,
    /// Any other transport failure
    Other,
}

impl TransportSignal {
    pub fn is_transient(self) -> bool {
        !matches!(self, TransportSignal::Other)
    }
}

impl fmt::Display for TransportSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportSignal::TimedOut => write!(f, "ETIMEDOUT"),
            TransportSignal::ConnectionRefused => write!(f, "ECONNREFUSED"),
            TransportSignal::ServiceUnavailable => write!(f, "EUNAVAILABLE"),
            TransportSignal::Other => write!(f, "EOTHER"),
        }
    }
}

/// Errors raised by an [`UpstreamClient`](crate::UpstreamClient)
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("Network error ({signal}): {message}")]
    Transport {
        signal: TransportSignal,
        message: String,
    },

    #[error("No text content in API response")]
    MissingText,

    #[error("Upstream service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Upstream client is not configured: {0}")]
    NotConfigured(String),
}

impl UpstreamError {
    pub fn timed_out(message: impl Into<String>) -> Self {
        UpstreamError::Transport {
            signal: TransportSignal::TimedOut,
            message: message.into(),
        }
    }

    pub fn connection_refused(message: impl Into<String>) -> Self {
        UpstreamError::Transport {
            signal: TransportSignal::ConnectionRefused,
            message: message.into(),
        }
    }
}

impl Classify for UpstreamError {
    fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::Transport { .. }
            | UpstreamError::Service { .. }
            | UpstreamError::NotConfigured(_) => ErrorKind::UpstreamUnavailable,
            UpstreamError::MissingText | UpstreamError::Decode(_) => ErrorKind::UpstreamMalformed,
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Transport { signal, message } => {
                signal.is_transient() || message.to_lowercase().contains("timeout")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Transport {
                signal: TransportSignal::TimedOut,
                message: format!("Request timed out: {}", err),
            }
        } else if err.is_connect() {
            UpstreamError::Transport {
                signal: TransportSignal::ConnectionRefused,
                message: format!("Connection failed: {}", err),
            }
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport {
                signal: TransportSignal::Other,
                message: err.to_string(),
            }
        }
    }
}
